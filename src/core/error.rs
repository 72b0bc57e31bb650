// 圧縮リクエスト全体で使用するエラー型定義

use std::path::{Path, PathBuf};
use thiserror::Error;

/// 圧縮リクエストの致命的なエラー
///
/// 画像1枚単位の失敗はここに含まれない（`ImageOutcome::Failed` として収集される）。
#[derive(Error, Debug)]
pub enum ShrinkError {
    #[error("入力ファイルが見つかりません: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("入力ファイルを読み込めません: {} - {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("未対応のフォーマット: {tag}")]
    UnsupportedFormat { tag: String },

    #[error("目標サイズが不正です: {reason}")]
    InvalidTarget { reason: String },

    #[error("設定エラー: {message}")]
    Configuration { message: String },

    #[error("コンテナI/Oエラー: {} - {source}", path.display())]
    ContainerIo {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("ドキュメント読み込みエラー: {} - {source}", path.display())]
    DocumentLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("ドキュメント書き込みエラー: {} - {source}", path.display())]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/Oエラー: {context} - {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("タスクエラー: {source}")]
    Task {
        #[source]
        source: tokio::task::JoinError,
    },
}

impl ShrinkError {
    pub fn input_not_found(path: impl AsRef<Path>) -> Self {
        Self::InputNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn invalid_input(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_format(tag: impl Into<String>) -> Self {
        Self::UnsupportedFormat { tag: tag.into() }
    }

    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// コンテナ（zip）の展開・再アーカイブ失敗
    pub fn container_io(path: impl AsRef<Path>, source: impl Into<anyhow::Error>) -> Self {
        Self::ContainerIo {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    pub fn document_load(path: impl AsRef<Path>, source: impl Into<anyhow::Error>) -> Self {
        Self::DocumentLoad {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    pub fn document_write(path: impl AsRef<Path>, source: impl Into<anyhow::Error>) -> Self {
        Self::DocumentWrite {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::Task { source }
    }

    /// 呼び出し側に「コンテナI/Oエラー」として区別して報告すべきかどうか
    pub fn is_container_error(&self) -> bool {
        matches!(self, Self::ContainerIo { .. })
    }

    /// トライアル開始前に検出される入力・設定系のエラーかどうか
    pub fn is_precondition_error(&self) -> bool {
        matches!(
            self,
            Self::InputNotFound { .. }
                | Self::InvalidInput { .. }
                | Self::UnsupportedFormat { .. }
                | Self::InvalidTarget { .. }
                | Self::Configuration { .. }
                | Self::DocumentLoad { .. }
        )
    }
}

/// 圧縮処理の結果型
pub type ShrinkResult<T> = std::result::Result<T, ShrinkError>;
