// コアレイヤー - データモデルとエラー定義
// 他のレイヤーから参照される基本的な型を提供

pub mod error;
pub mod types;

// 公開API
pub use error::{ShrinkError, ShrinkResult};
pub use types::{
    BatchReport, Document, DocumentFormat, FormatFamily, ImageFailure, ImageOutcome,
    ReencodeMetadata, Scale, ShrinkOutcome, ShrinkReport, TargetSize, TrialArtifact,
    TrialParams, TrialRecord,
};
