// サイズ目標探索
//
// トライアルは常に1つずつ順番に実行する。

pub mod cache;
pub mod engine;

pub use cache::ArtifactCache;
pub use engine::{SearchEngine, SearchOutcome};
