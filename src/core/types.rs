// 圧縮リクエストに関連するデータ型定義

use super::error::{ShrinkError, ShrinkResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const BYTES_PER_KB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 入力ドキュメントのフォーマットタグ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Xlsx,
}

/// フォーマットの系統（フラットバイナリかzipコンテナか）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    FlatBinary,
    ZipContainer,
}

impl DocumentFormat {
    pub fn family(&self) -> FormatFamily {
        match self {
            Self::Pdf => FormatFamily::FlatBinary,
            Self::Docx | Self::Xlsx => FormatFamily::ZipContainer,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
        }
    }

    /// 拡張子からフォーマットを推定
    pub fn from_path(path: &Path) -> ShrinkResult<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();
        extension.parse()
    }
}

impl FromStr for DocumentFormat {
    type Err = ShrinkError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(ShrinkError::unsupported_format(tag)),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 読み取り専用の入力ドキュメント
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub size_bytes: u64,
}

impl Document {
    /// 入力を検証して開く。フォーマット未指定の場合は拡張子から推定する
    pub fn open(path: impl AsRef<Path>, format: Option<DocumentFormat>) -> ShrinkResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ShrinkError::input_not_found(path));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| ShrinkError::invalid_input(path, e.to_string()))?;
        if !metadata.is_file() {
            return Err(ShrinkError::invalid_input(path, "通常のファイルではありません"));
        }

        let format = match format {
            Some(format) => format,
            None => DocumentFormat::from_path(path)?,
        };

        Ok(Self {
            path: path.to_path_buf(),
            format,
            size_bytes: metadata.len(),
        })
    }
}

/// 線形リサンプリング倍率（千分率で保持し、ハッシュ可能なキーにする）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Scale(u16);

impl Scale {
    pub const FULL: Scale = Scale(1000);

    pub fn from_factor(factor: f64) -> ShrinkResult<Self> {
        if !factor.is_finite() || factor <= 0.0 || factor > 1.0 {
            return Err(ShrinkError::configuration(format!(
                "scale は (0, 1] の範囲で指定してください: {factor}"
            )));
        }
        let thousandths = (factor * 1000.0).round() as u16;
        if thousandths == 0 {
            return Err(ShrinkError::configuration(format!(
                "scale が小さすぎます: {factor}"
            )));
        }
        Ok(Self(thousandths))
    }

    pub fn factor(&self) -> f64 {
        f64::from(self.0) / 1000.0
    }

    pub fn thousandths(&self) -> u16 {
        self.0
    }

    pub fn is_full(&self) -> bool {
        self.0 >= 1000
    }
}

impl From<Scale> for f64 {
    fn from(scale: Scale) -> Self {
        scale.factor()
    }
}

impl TryFrom<f64> for Scale {
    type Error = ShrinkError;

    fn try_from(factor: f64) -> Result<Self, Self::Error> {
        Scale::from_factor(factor)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.factor())
    }
}

/// 1回のトライアルを完全に決定するパラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialParams {
    pub quality: u8,
    pub scale: Scale,
}

impl TrialParams {
    pub fn new(quality: u8, scale: Scale) -> Self {
        Self { quality, scale }
    }
}

impl fmt::Display for TrialParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q:{} S:{}", self.quality, self.scale)
    }
}

/// 目標サイズ（バイト）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetSize {
    bytes: u64,
}

impl TargetSize {
    pub fn from_bytes(bytes: u64) -> ShrinkResult<Self> {
        if bytes == 0 {
            return Err(ShrinkError::invalid_target("0バイトは指定できません"));
        }
        Ok(Self { bytes })
    }

    pub fn from_megabytes(megabytes: f64) -> ShrinkResult<Self> {
        Self::from_fractional(megabytes, BYTES_PER_MB, "MB")
    }

    pub fn from_kilobytes(kilobytes: f64) -> ShrinkResult<Self> {
        Self::from_fractional(kilobytes, BYTES_PER_KB, "KB")
    }

    fn from_fractional(value: f64, unit: f64, unit_name: &str) -> ShrinkResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ShrinkError::invalid_target(format!(
                "正の数を指定してください: {value} {unit_name}"
            )));
        }
        // 整数サイズとの比較なので切り捨てても判定は変わらない
        let bytes = (value * unit).floor() as u64;
        if bytes == 0 {
            return Err(ShrinkError::invalid_target(format!(
                "1バイト未満になります: {value} {unit_name}"
            )));
        }
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn fits(&self, size_bytes: u64) -> bool {
        size_bytes <= self.bytes
    }
}

/// 画像1枚の再エンコード時のメタデータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReencodeMetadata {
    pub original_bytes: u64,
    pub encoded_bytes: u64,
    pub original_dimensions: (u32, u32),
    pub final_dimensions: (u32, u32),
    pub was_resized: bool,
}

/// 画像1枚単位の処理結果
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Success {
        /// ファイルパス、またはPDF内のオブジェクト識別子
        item: String,
        metadata: ReencodeMetadata,
    },
    Failed {
        item: String,
        error: String,
    },
}

impl ImageOutcome {
    pub fn item(&self) -> &str {
        match self {
            Self::Success { item, .. } | Self::Failed { item, .. } => item,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageFailure {
    pub item: String,
    pub error: String,
}

/// バッチ処理全体のレポート
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub total_files: usize,
    pub succeeded: usize,
    pub failures: Vec<ImageFailure>,
    pub elapsed_ms: u64,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<ImageOutcome>, elapsed_ms: u64) -> Self {
        let mut report = Self {
            total_files: outcomes.len(),
            elapsed_ms,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                ImageOutcome::Success { .. } => report.succeeded += 1,
                ImageOutcome::Failed { item, error } => {
                    report.failures.push(ImageFailure { item, error })
                }
            }
        }
        report
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.total_files += other.total_files;
        self.succeeded += other.succeeded;
        self.failures.extend(other.failures);
        self.elapsed_ms += other.elapsed_ms;
    }
}

/// 1回のトライアルで生成された成果物
#[derive(Debug, Clone)]
pub struct TrialArtifact {
    pub params: TrialParams,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub images: BatchReport,
}

/// 実行済みトライアル1回分の記録
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub params: TrialParams,
    pub size_bytes: u64,
    pub fits: bool,
    pub image_failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkOutcome {
    AlreadyUnderTarget,
    TargetMet,
    TargetMissed,
}

/// 圧縮リクエストの結果記述子
#[derive(Debug, Clone, Serialize)]
pub struct ShrinkReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: DocumentFormat,
    pub outcome: ShrinkOutcome,
    /// 出力に使われたパラメータ。無加工コピーの場合のみ None
    pub chosen: Option<TrialParams>,
    pub original_bytes: u64,
    pub final_bytes: u64,
    pub target_bytes: u64,
    pub trials_run: usize,
    pub image_failures: usize,
    /// 探索中のトライアル履歴（実行順）
    pub trials: Vec<TrialRecord>,
    pub finished_at: DateTime<Utc>,
}

impl ShrinkReport {
    pub fn met_target(&self) -> bool {
        matches!(
            self.outcome,
            ShrinkOutcome::AlreadyUnderTarget | ShrinkOutcome::TargetMet
        )
    }

    pub fn chosen_quality(&self) -> Option<u8> {
        self.chosen.map(|params| params.quality)
    }

    pub fn chosen_scale(&self) -> Option<f64> {
        self.chosen.map(|params| params.scale.factor())
    }

    pub fn summary(&self) -> String {
        match (self.outcome, self.chosen) {
            (ShrinkOutcome::AlreadyUnderTarget, _) | (_, None) => {
                "Already under target".to_string()
            }
            (outcome, Some(params)) => format!(
                "Target Met: {} ({params})",
                outcome == ShrinkOutcome::TargetMet
            ),
        }
    }
}
