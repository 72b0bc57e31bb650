// テスト用の進捗報告モック実装

use super::traits::ProgressReporter;
use crate::core::{Document, Scale, ShrinkReport, TargetSize, TrialArtifact, TrialParams};
use std::sync::{Arc, Mutex};

/// 呼び出しを記録するだけのレポーター
#[derive(Clone, Default)]
pub struct RecordingProgressReporter {
    pub started: Arc<Mutex<Option<u64>>>,
    pub trials: Arc<Mutex<Vec<(TrialParams, u64, bool)>>>,
    pub scales: Arc<Mutex<Vec<(Scale, bool)>>>,
    pub completed: Arc<Mutex<Option<ShrinkReport>>>,
}

impl RecordingProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trial_params(&self) -> Vec<TrialParams> {
        self.trials.lock().unwrap().iter().map(|t| t.0).collect()
    }
}

#[async_trait::async_trait]
impl ProgressReporter for RecordingProgressReporter {
    async fn report_started(&self, _document: &Document, target: TargetSize) {
        *self.started.lock().unwrap() = Some(target.bytes());
    }

    async fn report_trial(&self, artifact: &TrialArtifact, fits: bool) {
        self.trials
            .lock()
            .unwrap()
            .push((artifact.params, artifact.size_bytes, fits));
    }

    async fn report_scale_finished(&self, scale: Scale, found_fit: bool) {
        self.scales.lock().unwrap().push((scale, found_fit));
    }

    async fn report_completed(&self, report: &ShrinkReport) {
        *self.completed.lock().unwrap() = Some(report.clone());
    }
}
