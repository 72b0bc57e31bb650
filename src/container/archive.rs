use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// zipを展開する。展開先の外へ出るエントリは `ZipArchive::extract` が拒否する
pub fn extract_archive(archive_path: &Path, destination: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("アーカイブを開けません: {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("zipとして読み込めません: {}", archive_path.display()))?;
    archive
        .extract(destination)
        .with_context(|| format!("展開に失敗: {}", archive_path.display()))?;
    Ok(())
}

fn archive_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
}

/// ディレクトリツリーをzipに書き出し、書き込んだバイト数を返す
///
/// ファイル名順に走査し、タイムスタンプを固定するため、
/// 同じ内容のツリーからは同じバイト列が得られる。
pub fn write_archive(root: &Path, output: &Path) -> Result<u64> {
    let file = File::create(output)
        .with_context(|| format!("出力ファイルを作成できません: {}", output.display()))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = archive_options();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        writer
            .start_file(name.as_str(), options)
            .with_context(|| format!("エントリを追加できません: {name}"))?;
        let data = std::fs::read(entry.path())
            .with_context(|| format!("読み込みに失敗: {}", entry.path().display()))?;
        writer.write_all(&data)?;
    }

    let mut inner = writer.finish().context("zipの書き込みを完了できません")?;
    inner.flush()?;
    drop(inner);

    Ok(std::fs::metadata(output)?.len())
}
