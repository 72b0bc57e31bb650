use super::parse_format;
use crate::batch::scanner::MediaScanner;
use crate::codec::pdf;
use crate::container::ContainerWorkspace;
use crate::core::{Document, FormatFamily, ShrinkError};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSummary {
    pub directory: String,
    pub images: usize,
    pub bytes: u64,
}

/// ドキュメント内の画像の概要
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inspection {
    Container { media: Vec<MediaSummary> },
    Pdf { pages: usize, images: usize },
}

async fn inspect_container(document: &Document) -> Result<Inspection> {
    let workspace = ContainerWorkspace::materialize(document).await?;
    let mut media = Vec::new();

    for dir in workspace.media_dirs() {
        let files = MediaScanner::scan_directory(&dir.live)?;
        let mut bytes = 0;
        for file in &files {
            bytes += std::fs::metadata(file)?.len();
        }
        media.push(MediaSummary {
            directory: dir.relative.to_string_lossy().replace('\\', "/"),
            images: files.len(),
            bytes,
        });
    }

    Ok(Inspection::Container { media })
}

async fn inspect_pdf(document: &Document) -> Result<Inspection> {
    let path = document.path.clone();
    let inspection = tokio::task::spawn_blocking(move || {
        pdf::load_document(&path)
            .map(|doc| Inspection::Pdf {
                pages: pdf::page_count(&doc),
                images: pdf::collect_image_ids(&doc).len(),
            })
            .map_err(|e| ShrinkError::document_load(&path, e))
    })
    .await
    .map_err(ShrinkError::task)??;
    Ok(inspection)
}

pub async fn execute_inspect(input: PathBuf, format: Option<String>) -> Result<Inspection> {
    let format = parse_format(format.as_deref())?;
    let document = Document::open(&input, format)?;

    println!(
        "🔍 {} ({}, {:.1} KB)",
        document.path.display(),
        document.format,
        document.size_bytes as f64 / 1024.0
    );

    let inspection = match document.format.family() {
        FormatFamily::ZipContainer => inspect_container(&document).await?,
        FormatFamily::FlatBinary => inspect_pdf(&document).await?,
    };

    match &inspection {
        Inspection::Container { media } if media.is_empty() => {
            println!("   - メディアディレクトリはありません");
        }
        Inspection::Container { media } => {
            for summary in media {
                println!(
                    "   - {}: 画像 {} 枚 ({:.1} KB)",
                    summary.directory,
                    summary.images,
                    summary.bytes as f64 / 1024.0
                );
            }
        }
        Inspection::Pdf { pages, images } => {
            println!("   - ページ数: {pages}");
            println!("   - 画像XObject: {images}");
        }
    }

    Ok(inspection)
}
