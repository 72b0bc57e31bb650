use crate::core::{ShrinkError, ShrinkResult, TrialArtifact, TrialParams};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// トライアル成果物の一時保管庫（パラメータをキーにする）
pub struct ArtifactCache {
    dir: TempDir,
    extension: String,
    entries: HashMap<TrialParams, TrialArtifact>,
}

impl ArtifactCache {
    pub fn new(extension: &str) -> ShrinkResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("doc_shrink-trials-")
            .tempdir()
            .map_err(|e| ShrinkError::io("トライアル用一時ディレクトリ", e))?;
        Ok(Self {
            dir,
            extension: extension.to_string(),
            entries: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// パラメータごとの書き出し先
    pub fn slot_for(&self, params: TrialParams) -> PathBuf {
        self.dir.path().join(format!(
            "trial-q{}-s{}.{}",
            params.quality,
            params.scale.thousandths(),
            self.extension
        ))
    }

    pub fn insert(&mut self, artifact: TrialArtifact) {
        self.entries.insert(artifact.params, artifact);
    }

    /// ファイルが残っている場合のみ返す
    pub fn get(&self, params: TrialParams) -> Option<&TrialArtifact> {
        self.entries
            .get(&params)
            .filter(|artifact| artifact.path.is_file())
    }

    pub fn contains(&self, params: TrialParams) -> bool {
        self.get(params).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `keep` 以外の成果物をディスクから削除する
    pub fn retain_only(&mut self, keep: &[TrialParams]) {
        self.entries.retain(|params, artifact| {
            if keep.contains(params) {
                return true;
            }
            match std::fs::remove_file(&artifact.path) {
                Ok(()) => log::debug!("キャッシュから削除: {params}"),
                Err(e) => log::debug!("キャッシュ削除に失敗: {} - {e}", artifact.path.display()),
            }
            false
        });
    }
}
