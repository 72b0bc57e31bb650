use super::TrialExecutor;
use crate::codec::{pdf, RasterCodec};
use crate::core::{Document, ShrinkError, ShrinkResult, TrialArtifact, TrialParams};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// PDF用の実行器。トライアルごとに元のPDFを読み直す
pub struct PdfTrialExecutor<C: ?Sized> {
    source: PathBuf,
    codec: Arc<C>,
}

impl<C> PdfTrialExecutor<C>
where
    C: RasterCodec + ?Sized + 'static,
{
    /// 入力を一度解析し、壊れたPDFはトライアル前に拒否する
    pub async fn prepare(document: &Document, codec: Arc<C>) -> ShrinkResult<Self> {
        let source = document.path.clone();
        let pages = tokio::task::spawn_blocking({
            let source = source.clone();
            move || {
                pdf::load_document(&source)
                    .map(|doc| pdf::page_count(&doc))
                    .map_err(|e| ShrinkError::document_load(&source, e))
            }
        })
        .await
        .map_err(ShrinkError::task)??;

        log::info!("{} を解析: {pages} ページ", source.display());
        Ok(Self { source, codec })
    }
}

#[async_trait]
impl<C> TrialExecutor for PdfTrialExecutor<C>
where
    C: RasterCodec + ?Sized + 'static,
{
    async fn run_trial(&self, params: TrialParams, output: &Path) -> ShrinkResult<TrialArtifact> {
        let source = self.source.clone();
        let output = output.to_path_buf();
        let codec = self.codec.clone();

        tokio::task::spawn_blocking(move || {
            let mut doc = pdf::load_document(&source)
                .map_err(|e| ShrinkError::document_load(&source, e))?;
            let images = pdf::rewrite_images(&mut doc, codec.as_ref(), params);
            let size_bytes = pdf::save_document(&mut doc, &output)
                .map_err(|e| ShrinkError::document_write(&output, e))?;

            Ok(TrialArtifact {
                params,
                path: output,
                size_bytes,
                images,
            })
        })
        .await
        .map_err(ShrinkError::task)?
    }
}
