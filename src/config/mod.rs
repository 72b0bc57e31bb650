// 探索エンジンの設定管理
//
// グローバル定数ではなく、設定構造体として探索エンジンへ明示的に渡す。

use crate::core::{Scale, ShrinkError, ShrinkResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_SCALE_SCHEDULE: [f64; 4] = [1.0, 0.75, 0.5, 0.25];
pub const DEFAULT_QUALITY_MIN: u8 = 10;
pub const DEFAULT_QUALITY_MAX: u8 = 95;
pub const DEFAULT_PROBES_PER_SCALE: usize = 5;

/// サイズ目標探索の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 画像バッチ圧縮の同時実行ワーカー数
    pub worker_count: usize,
    /// 試行するスケールの降順スケジュール
    pub scale_schedule: Vec<f64>,
    pub quality_min: u8,
    pub quality_max: u8,
    /// スケール1つあたりの二分探索の試行回数
    pub probes_per_scale: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            scale_schedule: DEFAULT_SCALE_SCHEDULE.to_vec(),
            quality_min: DEFAULT_QUALITY_MIN,
            quality_max: DEFAULT_QUALITY_MAX,
            probes_per_scale: DEFAULT_PROBES_PER_SCALE,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 論理CPU数をワーカー数に使うプリセット
    pub fn high_throughput() -> Self {
        Self::default().with_worker_count(num_cpus::get().max(1))
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_scale_schedule(mut self, schedule: Vec<f64>) -> Self {
        self.scale_schedule = schedule;
        self
    }

    pub fn with_quality_bounds(mut self, min: u8, max: u8) -> Self {
        self.quality_min = min;
        self.quality_max = max;
        self
    }

    pub fn with_probes_per_scale(mut self, probes: usize) -> Self {
        self.probes_per_scale = probes;
        self
    }

    /// JSONファイルから設定を読み込む（省略したフィールドはデフォルト値）
    pub fn from_json_file(path: &Path) -> ShrinkResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ShrinkError::io(format!("設定ファイル {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ShrinkError::configuration(format!("{} の解析に失敗: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ShrinkResult<()> {
        if self.worker_count == 0 {
            return Err(ShrinkError::configuration("worker_count は1以上が必要です"));
        }
        if self.probes_per_scale == 0 {
            return Err(ShrinkError::configuration(
                "probes_per_scale は1以上が必要です",
            ));
        }
        if self.quality_min == 0 || self.quality_min > self.quality_max || self.quality_max > 100
        {
            return Err(ShrinkError::configuration(format!(
                "quality の範囲が不正です: [{}, {}]",
                self.quality_min, self.quality_max
            )));
        }
        self.scales().map(|_| ())
    }

    /// スケジュールを検証済みの `Scale` 列として取得
    pub fn scales(&self) -> ShrinkResult<Vec<Scale>> {
        if self.scale_schedule.is_empty() {
            return Err(ShrinkError::configuration("scale_schedule が空です"));
        }
        self.scale_schedule
            .iter()
            .map(|factor| Scale::from_factor(*factor))
            .collect()
    }
}
