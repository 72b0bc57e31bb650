// 進捗報告の具象実装

use super::traits::ProgressReporter;
use crate::core::{Document, Scale, ShrinkReport, TargetSize, TrialArtifact};
use async_trait::async_trait;

fn kilobytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, document: &Document, target: TargetSize) {
        if !self.quiet {
            println!(
                "🚀 {} ({:.1} KB) → 目標 {:.1} KB",
                document.path.display(),
                kilobytes(document.size_bytes),
                kilobytes(target.bytes())
            );
        }
    }

    async fn report_trial(&self, artifact: &TrialArtifact, fits: bool) {
        if !self.quiet {
            let mark = if fits { "✓" } else { "✗" };
            println!(
                "   {mark} {} → {:.1} KB",
                artifact.params,
                kilobytes(artifact.size_bytes)
            );
            if artifact.images.failed_count() > 0 {
                eprintln!(
                    "   ⚠️  {} 枚の画像を処理できませんでした",
                    artifact.images.failed_count()
                );
            }
        }
    }

    async fn report_scale_finished(&self, scale: Scale, found_fit: bool) {
        if !self.quiet && found_fit {
            println!("🎯 スケール {scale} で目標を達成");
        }
    }

    async fn report_completed(&self, report: &ShrinkReport) {
        if !self.quiet {
            println!(
                "✅ 完了: {:.1} KB → {:.1} KB ({} トライアル)",
                kilobytes(report.original_bytes),
                kilobytes(report.final_bytes),
                report.trials_run
            );
        }
    }
}

/// 何もしない進捗報告実装（ライブラリ呼び出し・テスト用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _document: &Document, _target: TargetSize) {
        // 何もしない
    }

    async fn report_trial(&self, _artifact: &TrialArtifact, _fits: bool) {
        // 何もしない
    }

    async fn report_scale_finished(&self, _scale: Scale, _found_fit: bool) {
        // 何もしない
    }

    async fn report_completed(&self, _report: &ShrinkReport) {
        // 何もしない
    }
}
