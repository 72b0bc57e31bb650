// Consumer - 並列ワーカー機能

use crate::codec::RasterCodec;
use crate::core::{ImageOutcome, TrialParams};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// 1ファイルを再エンコードし、結果を `ImageOutcome` にまとめる
pub async fn compress_single_file<C>(codec: &C, path: &Path, params: TrialParams) -> ImageOutcome
where
    C: RasterCodec + ?Sized,
{
    let item = path.display().to_string();
    match codec.reencode_file(path, params).await {
        Ok(metadata) => ImageOutcome::Success { item, metadata },
        Err(error) => {
            log::debug!("画像 {item} をスキップ: {error:#}");
            ImageOutcome::Failed {
                item,
                error: format!("{error:#}"),
            }
        }
    }
}

/// 単一Consumerワーカー
pub fn spawn_single_consumer<C>(
    codec: Arc<C>,
    params: TrialParams,
    work_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<PathBuf>>>,
    result_tx: mpsc::Sender<ImageOutcome>,
) -> tokio::task::JoinHandle<()>
where
    C: RasterCodec + ?Sized + 'static,
{
    tokio::spawn(async move {
        loop {
            // 次の作業を取得
            let path = {
                let mut rx = work_rx.lock().await;
                match rx.recv().await {
                    Some(path) => path,
                    None => break,
                }
            };

            let outcome = compress_single_file(codec.as_ref(), &path, params).await;

            if result_tx.send(outcome).await.is_err() {
                break;
            }
        }
    })
}

/// Consumers: 並列ワーカープール
pub fn spawn_consumers<C>(
    codec: Arc<C>,
    params: TrialParams,
    work_rx: mpsc::Receiver<PathBuf>,
    result_tx: mpsc::Sender<ImageOutcome>,
    worker_count: usize,
) -> Vec<tokio::task::JoinHandle<()>>
where
    C: RasterCodec + ?Sized + 'static,
{
    let work_rx = Arc::new(tokio::sync::Mutex::new(work_rx));

    (0..worker_count)
        .map(|_| {
            spawn_single_consumer(codec.clone(), params, work_rx.clone(), result_tx.clone())
        })
        .collect()
}
