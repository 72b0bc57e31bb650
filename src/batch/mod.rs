// 画像バッチ圧縮
//
// メディアディレクトリ内のラスタ画像を Producer-Consumer 方式で並列に
// 再エンコードする。1枚の失敗はバッチ全体を止めない。

pub mod consumer;
pub mod scanner;

use crate::codec::RasterCodec;
use crate::core::{BatchReport, ShrinkError, ShrinkResult, TrialParams};
use consumer::spawn_consumers;
use scanner::MediaScanner;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const CHANNEL_BUFFER_SIZE: usize = 64;

/// ディレクトリ単位の画像バッチ圧縮器
pub struct ImageBatchCompressor<C: ?Sized> {
    codec: Arc<C>,
    worker_count: usize,
}

impl<C> ImageBatchCompressor<C>
where
    C: RasterCodec + ?Sized + 'static,
{
    pub fn new(codec: Arc<C>, worker_count: usize) -> ShrinkResult<Self> {
        if worker_count == 0 {
            return Err(ShrinkError::configuration("worker_count は1以上が必要です"));
        }
        Ok(Self {
            codec,
            worker_count,
        })
    }

    /// ディレクトリ以下の対象画像をすべて再エンコードする
    pub async fn compress_directory(
        &self,
        directory: &Path,
        params: TrialParams,
    ) -> ShrinkResult<BatchReport> {
        let start_time = Instant::now();

        let files = MediaScanner::scan_directory(directory)
            .map_err(|e| ShrinkError::container_io(directory, e))?;
        if files.is_empty() {
            return Ok(BatchReport::default());
        }
        let total_files = files.len();

        let (work_tx, work_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (result_tx, mut result_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let consumer_handles = spawn_consumers(
            self.codec.clone(),
            params,
            work_rx,
            result_tx,
            self.worker_count.min(total_files),
        );

        // Producer: 結果の回収と並行して投入する
        let producer_handle = tokio::spawn(async move {
            for path in files {
                if work_tx.send(path).await.is_err() {
                    break;
                }
            }
        });

        let mut outcomes = Vec::with_capacity(total_files);
        while let Some(outcome) = result_rx.recv().await {
            outcomes.push(outcome);
        }

        producer_handle.await.map_err(ShrinkError::task)?;
        for handle in consumer_handles {
            handle.await.map_err(ShrinkError::task)?;
        }

        // ワーカーの完了順に依存しないよう並べ替える
        outcomes.sort_by(|a, b| a.item().cmp(b.item()));
        let report = BatchReport::from_outcomes(outcomes, start_time.elapsed().as_millis() as u64);

        log::debug!(
            "{}: {}/{} 枚を再エンコード ({})",
            directory.display(),
            report.succeeded,
            report.total_files,
            params
        );
        Ok(report)
    }
}
