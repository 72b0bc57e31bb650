// zipコンテナ（docx / xlsx）の展開・メディア管理・再アーカイブ
//
// 展開ツリーと元画像のスナップショットはどちらも `TempDir` が所有し、
// `ContainerWorkspace` の破棄とともに削除される。

pub mod archive;
pub mod media;

use crate::core::{Document, ShrinkError, ShrinkResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 展開ツリー内のメディアディレクトリと、そのスナップショットの位置
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDirectory {
    /// 展開ルートからの相対パス（例: `word/media`）
    pub relative: PathBuf,
    pub live: PathBuf,
    pub pristine: PathBuf,
}

/// 1リクエスト分の作業領域
pub struct ContainerWorkspace {
    extraction: TempDir,
    _snapshot: TempDir,
    media: Vec<MediaDirectory>,
}

fn scratch_dir(prefix: &str) -> ShrinkResult<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|e| ShrinkError::io(format!("一時ディレクトリ {prefix}"), e))
}

impl ContainerWorkspace {
    /// ドキュメントを展開し、全メディアディレクトリのスナップショットを取る（同期処理）
    pub fn materialize_blocking(document_path: &Path) -> ShrinkResult<Self> {
        let extraction = scratch_dir("doc_shrink-extract-")?;
        let snapshot = scratch_dir("doc_shrink-pristine-")?;

        archive::extract_archive(document_path, extraction.path())
            .map_err(|e| ShrinkError::container_io(document_path, e))?;

        let live_dirs = media::find_media_dirs(extraction.path())
            .map_err(|e| ShrinkError::container_io(document_path, e))?;

        let mut media_dirs = Vec::with_capacity(live_dirs.len());
        for live in live_dirs {
            let relative = live
                .strip_prefix(extraction.path())
                .map(Path::to_path_buf)
                .map_err(|e| ShrinkError::container_io(&live, e))?;
            let pristine = snapshot.path().join(&relative);
            media::copy_dir_recursive(&live, &pristine)
                .map_err(|e| ShrinkError::container_io(&live, e))?;
            media_dirs.push(MediaDirectory {
                relative,
                live,
                pristine,
            });
        }

        log::info!(
            "{} を展開: メディアディレクトリ {} 件",
            document_path.display(),
            media_dirs.len()
        );

        Ok(Self {
            extraction,
            _snapshot: snapshot,
            media: media_dirs,
        })
    }

    pub async fn materialize(document: &Document) -> ShrinkResult<Self> {
        let path = document.path.clone();
        tokio::task::spawn_blocking(move || Self::materialize_blocking(&path))
            .await
            .map_err(ShrinkError::task)?
    }

    pub fn root(&self) -> &Path {
        self.extraction.path()
    }

    pub fn media_dirs(&self) -> &[MediaDirectory] {
        &self.media
    }

    /// メディアディレクトリをスナップショットの内容に戻す
    pub async fn restore(&self, media: &MediaDirectory) -> ShrinkResult<()> {
        let live = media.live.clone();
        let pristine = media.pristine.clone();
        tokio::task::spawn_blocking(move || {
            media::restore_media_dir(&live, &pristine)
                .map_err(|e| ShrinkError::container_io(&live, e))
        })
        .await
        .map_err(ShrinkError::task)?
    }

    pub async fn restore_all(&self) -> ShrinkResult<()> {
        for media in &self.media {
            self.restore(media).await?;
        }
        Ok(())
    }

    /// 展開ツリー全体をzipとして書き出す
    pub async fn archive_to(&self, output: &Path) -> ShrinkResult<u64> {
        let root = self.root().to_path_buf();
        let output = output.to_path_buf();
        tokio::task::spawn_blocking(move || {
            archive::write_archive(&root, &output)
                .map_err(|e| ShrinkError::container_io(&output, e))
        })
        .await
        .map_err(ShrinkError::task)?
    }
}
