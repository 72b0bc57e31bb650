// トライアル実行
//
// 1組の (quality, scale) で圧縮パイプラインを1回実行し、成果物を書き出す。

pub mod container;
pub mod pdf;

use crate::codec::RasterCodec;
use crate::core::{Document, FormatFamily, ShrinkResult, TrialArtifact, TrialParams};
use async_trait::async_trait;
use mockall::automock;
use std::path::Path;
use std::sync::Arc;

pub use container::ContainerTrialExecutor;
pub use pdf::PdfTrialExecutor;

/// トライアル実行器のトレイト
#[automock]
#[async_trait]
pub trait TrialExecutor: Send + Sync {
    /// 指定パラメータでトライアルを実行し、`output` に成果物を書き出す
    async fn run_trial(&self, params: TrialParams, output: &Path) -> ShrinkResult<TrialArtifact>;
}

// TrialExecutor for Box<dyn TrialExecutor>
#[async_trait]
impl TrialExecutor for Box<dyn TrialExecutor> {
    async fn run_trial(&self, params: TrialParams, output: &Path) -> ShrinkResult<TrialArtifact> {
        self.as_ref().run_trial(params, output).await
    }
}

/// フォーマット系統に応じた実行器を準備する
pub async fn prepare_executor<C>(
    document: &Document,
    codec: Arc<C>,
    worker_count: usize,
) -> ShrinkResult<Box<dyn TrialExecutor>>
where
    C: RasterCodec + ?Sized + 'static,
{
    let executor: Box<dyn TrialExecutor> = match document.format.family() {
        FormatFamily::ZipContainer => {
            Box::new(ContainerTrialExecutor::prepare(document, codec, worker_count).await?)
        }
        FormatFamily::FlatBinary => Box::new(PdfTrialExecutor::prepare(document, codec).await?),
    };
    Ok(executor)
}
