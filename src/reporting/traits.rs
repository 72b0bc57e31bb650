// 進捗報告のトレイト定義

use crate::core::{Document, Scale, ShrinkReport, TargetSize, TrialArtifact};
use async_trait::async_trait;

/// 進捗報告を抽象化するトレイト
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// 探索開始時の報告
    async fn report_started(&self, document: &Document, target: TargetSize);

    /// トライアル1回ごとの報告
    async fn report_trial(&self, artifact: &TrialArtifact, fits: bool);

    /// スケール1つ分の探索が終わったときの報告
    async fn report_scale_finished(&self, scale: Scale, found_fit: bool);

    /// リクエスト完了時の報告
    async fn report_completed(&self, report: &ShrinkReport);
}

// ProgressReporter for Box<dyn ProgressReporter>
#[async_trait]
impl ProgressReporter for Box<dyn ProgressReporter> {
    async fn report_started(&self, document: &Document, target: TargetSize) {
        self.as_ref().report_started(document, target).await
    }

    async fn report_trial(&self, artifact: &TrialArtifact, fits: bool) {
        self.as_ref().report_trial(artifact, fits).await
    }

    async fn report_scale_finished(&self, scale: Scale, found_fit: bool) {
        self.as_ref().report_scale_finished(scale, found_fit).await
    }

    async fn report_completed(&self, report: &ShrinkReport) {
        self.as_ref().report_completed(report).await
    }
}
