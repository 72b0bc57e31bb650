use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MEDIA_DIR_NAME: &str = "media";

/// 名前が "media" のディレクトリを列挙する。見つけたディレクトリの中へは降りない
pub fn find_media_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut media_dirs = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry?;
        if entry.file_type().is_dir() && entry.file_name() == MEDIA_DIR_NAME {
            media_dirs.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    media_dirs.sort();
    Ok(media_dirs)
}

/// ディレクトリの中身を相対パスを保ったままコピーする
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<()> {
    if !source.is_dir() {
        bail!("コピー元がディレクトリではありません: {}", source.display());
    }
    fs::create_dir_all(destination)
        .with_context(|| format!("ディレクトリを作成できません: {}", destination.display()))?;

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let target = destination.join(entry.path().strip_prefix(source)?);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("コピーに失敗: {} -> {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

fn staging_path(live: &Path) -> PathBuf {
    let name = live
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    live.with_file_name(format!(".{name}.restore"))
}

/// メディアディレクトリをバックアップと同一の内容に戻す
///
/// 退避先に完全なコピーを作ってから差し替えるため、
/// コピー中の失敗では稼働中のディレクトリは変更されない。
pub fn restore_media_dir(live: &Path, pristine: &Path) -> Result<()> {
    let staging = staging_path(live);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }

    if let Err(error) = copy_dir_recursive(pristine, &staging) {
        let _ = fs::remove_dir_all(&staging);
        return Err(error);
    }

    if live.exists() {
        fs::remove_dir_all(live)
            .with_context(|| format!("削除に失敗: {}", live.display()))?;
    }
    fs::rename(&staging, live).with_context(|| {
        format!("置き換えに失敗: {} -> {}", staging.display(), live.display())
    })?;
    Ok(())
}
