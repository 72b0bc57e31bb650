use super::TrialExecutor;
use crate::batch::ImageBatchCompressor;
use crate::codec::RasterCodec;
use crate::container::ContainerWorkspace;
use crate::core::{BatchReport, Document, ShrinkResult, TrialArtifact, TrialParams};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// docx / xlsx 用の実行器
///
/// 毎回スナップショットからメディアを復元してから圧縮するので、
/// 前のトライアルの結果が次のトライアルに累積しない。
pub struct ContainerTrialExecutor<C: ?Sized> {
    workspace: ContainerWorkspace,
    compressor: ImageBatchCompressor<C>,
}

impl<C> ContainerTrialExecutor<C>
where
    C: RasterCodec + ?Sized + 'static,
{
    pub async fn prepare(
        document: &Document,
        codec: Arc<C>,
        worker_count: usize,
    ) -> ShrinkResult<Self> {
        let compressor = ImageBatchCompressor::new(codec, worker_count)?;
        let workspace = ContainerWorkspace::materialize(document).await?;
        Ok(Self {
            workspace,
            compressor,
        })
    }
}

#[async_trait]
impl<C> TrialExecutor for ContainerTrialExecutor<C>
where
    C: RasterCodec + ?Sized + 'static,
{
    async fn run_trial(&self, params: TrialParams, output: &Path) -> ShrinkResult<TrialArtifact> {
        let mut images = BatchReport::default();

        for media in self.workspace.media_dirs() {
            self.workspace.restore(media).await?;
            let report = self.compressor.compress_directory(&media.live, params).await?;
            images.merge(report);
        }

        let size_bytes = self.workspace.archive_to(output).await?;

        Ok(TrialArtifact {
            params,
            path: output.to_path_buf(),
            size_bytes,
            images,
        })
    }
}
