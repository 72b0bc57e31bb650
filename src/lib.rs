//! サイズ目標に合わせてドキュメント（PDF / docx / xlsx）を縮小する
//!
//! 埋め込み画像をスケール × 品質の組み合わせで再エンコードし、
//! 目標バイト数に収まる中で最も品質の高い組み合わせを探す。

pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod container;
pub mod core;
pub mod reporting;
pub mod search;
pub mod trial;

#[cfg(test)]
pub(crate) mod test_data;

use crate::codec::standard::StandardCodec;
use crate::codec::RasterCodec;
use crate::config::SearchConfig;
use crate::core::{
    Document, DocumentFormat, ShrinkError, ShrinkOutcome, ShrinkReport, ShrinkResult,
    TargetSize, TrialArtifact, TrialParams,
};
use crate::reporting::{NoOpProgressReporter, ProgressReporter};
use crate::search::{ArtifactCache, SearchEngine};
use crate::trial::{prepare_executor, TrialExecutor};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 1回の縮小リクエスト
#[derive(Debug, Clone)]
pub struct ShrinkRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub target: TargetSize,
    /// 未指定なら入力の拡張子から推定
    pub format: Option<DocumentFormat>,
}

impl ShrinkRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, target: TargetSize) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            target,
            format: None,
        }
    }

    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = Some(format);
        self
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// コーデック・進捗報告・設定を束ねた縮小処理の入口
pub struct Shrinker<C: ?Sized, R> {
    codec: Arc<C>,
    reporter: R,
    config: SearchConfig,
}

impl Shrinker<StandardCodec, NoOpProgressReporter> {
    /// 標準コーデック・デフォルト設定・出力なし
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(StandardCodec::new()),
            NoOpProgressReporter::new(),
            SearchConfig::default(),
        )
    }
}

impl<C, R> Shrinker<C, R>
where
    C: RasterCodec + ?Sized + 'static,
    R: ProgressReporter,
{
    pub fn new(codec: Arc<C>, reporter: R, config: SearchConfig) -> Self {
        Self {
            codec,
            reporter,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn open(&self, request: &ShrinkRequest) -> ShrinkResult<Document> {
        self.config.validate()?;
        let document = Document::open(&request.input, request.format)?;
        log::info!(
            "{} ({}, {} bytes) → 目標 {} bytes",
            document.path.display(),
            document.format,
            document.size_bytes,
            request.target.bytes()
        );
        Ok(document)
    }

    /// 既に目標以下なら無加工でコピーしてレポートを返す
    async fn copy_if_under_target(
        &self,
        document: &Document,
        request: &ShrinkRequest,
    ) -> ShrinkResult<Option<ShrinkReport>> {
        if !request.target.fits(document.size_bytes) {
            return Ok(None);
        }

        if !is_same_file(&document.path, &request.output) {
            tokio::fs::copy(&document.path, &request.output)
                .await
                .map_err(|e| {
                    ShrinkError::io(format!("{} へのコピー", request.output.display()), e)
                })?;
        }
        log::info!("既に目標サイズ以下のためコピーのみ行いました");

        Ok(Some(ShrinkReport {
            input: document.path.clone(),
            output: request.output.clone(),
            format: document.format,
            outcome: ShrinkOutcome::AlreadyUnderTarget,
            chosen: None,
            original_bytes: document.size_bytes,
            final_bytes: document.size_bytes,
            target_bytes: request.target.bytes(),
            trials_run: 0,
            image_failures: 0,
            trials: Vec::new(),
            finished_at: Utc::now(),
        }))
    }

    async fn search<E>(
        &self,
        document: &Document,
        request: &ShrinkRequest,
        executor: &E,
    ) -> ShrinkResult<ShrinkReport>
    where
        E: TrialExecutor + ?Sized,
    {
        let mut cache = ArtifactCache::new(document.format.extension())?;
        let engine = SearchEngine::new(executor, &self.reporter, &self.config);

        let mut outcome = engine.run(request.target, &mut cache).await?;
        let artifact = engine
            .materialize(&mut outcome, &mut cache, &request.output)
            .await?;

        let report = ShrinkReport {
            input: document.path.clone(),
            output: request.output.clone(),
            format: document.format,
            outcome: if outcome.found_fit {
                ShrinkOutcome::TargetMet
            } else {
                ShrinkOutcome::TargetMissed
            },
            chosen: Some(artifact.params),
            original_bytes: document.size_bytes,
            final_bytes: artifact.size_bytes,
            target_bytes: request.target.bytes(),
            trials_run: outcome.trials_run,
            image_failures: artifact.images.failed_count(),
            trials: std::mem::take(&mut outcome.history),
            finished_at: Utc::now(),
        };
        log::info!("{}", report.summary());
        Ok(report)
    }

    /// ドキュメントを目標サイズに縮小して `request.output` に書き出す
    pub async fn shrink(&self, request: &ShrinkRequest) -> ShrinkResult<ShrinkReport> {
        let document = self.open(request)?;
        self.reporter.report_started(&document, request.target).await;

        let report = match self.copy_if_under_target(&document, request).await? {
            Some(report) => report,
            None => {
                let executor =
                    prepare_executor(&document, self.codec.clone(), self.config.worker_count)
                        .await?;
                self.search(&document, request, executor.as_ref()).await?
            }
        };

        self.reporter.report_completed(&report).await;
        Ok(report)
    }

    /// 実行器を外から与えて縮小する
    pub async fn shrink_with_executor<E>(
        &self,
        request: &ShrinkRequest,
        executor: &E,
    ) -> ShrinkResult<ShrinkReport>
    where
        E: TrialExecutor + ?Sized,
    {
        let document = self.open(request)?;
        self.reporter.report_started(&document, request.target).await;

        let report = match self.copy_if_under_target(&document, request).await? {
            Some(report) => report,
            None => self.search(&document, request, executor).await?,
        };

        self.reporter.report_completed(&report).await;
        Ok(report)
    }

    /// 探索せずにトライアルを1回だけ実行する
    pub async fn run_single_trial(
        &self,
        input: &Path,
        format: Option<DocumentFormat>,
        params: TrialParams,
        output: &Path,
    ) -> ShrinkResult<TrialArtifact> {
        self.config.validate()?;
        let document = Document::open(input, format)?;
        let executor =
            prepare_executor(&document, self.codec.clone(), self.config.worker_count).await?;
        executor.run_trial(params, output).await
    }
}

/// デフォルト設定で縮小する
///
/// `format_tag` は `"pdf"`, `"docx"`, `"xlsx"` のいずれか。
pub async fn shrink_document(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    target_mb: f64,
    format_tag: &str,
) -> ShrinkResult<ShrinkReport> {
    let format: DocumentFormat = format_tag.parse()?;
    let target = TargetSize::from_megabytes(target_mb)?;
    let request = ShrinkRequest::new(input.as_ref(), output.as_ref(), target).with_format(format);

    Shrinker::with_defaults().shrink(&request).await
}
