use crate::codec::is_supported_raster;
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct MediaScanner;

impl MediaScanner {
    /// ディレクトリ以下の再エンコード対象ファイルを名前順で列挙する
    pub fn scan_directory(directory: &Path) -> Result<Vec<PathBuf>> {
        let mut file_paths = Vec::new();

        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = entry?;

            if entry.file_type().is_file() && is_supported_raster(entry.path()) {
                file_paths.push(entry.path().to_path_buf());
            }
        }

        Ok(file_paths)
    }
}
