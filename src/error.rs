use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploaderError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("有効な画像リンクではありません: {0}")]
    InvalidReference(String),

    #[error("Web画像のダウンロードに失敗: {0}")]
    Fetch(String),

    #[error("ファイルが存在しません: {0}")]
    NotFound(String),

    #[error("パスがファイルではありません: {0}")]
    NotAFile(String),

    #[error("HTTPエラー: {status}")]
    Http { status: u16 },

    #[error("アップロードが拒否されました: {0}")]
    UploadRejected(String),

    #[error("アップロード通信エラー: {0}")]
    Transport(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("{0}件の文書を処理できませんでした")]
    DocumentsFailed(usize),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] easyimage_common::Error),
}

impl UploaderError {
    /// 参照1件に閉じたエラーか（一括処理を止めない）
    pub fn is_per_reference(&self) -> bool {
        matches!(
            self,
            UploaderError::InvalidReference(_)
                | UploaderError::Fetch(_)
                | UploaderError::NotFound(_)
                | UploaderError::NotAFile(_)
                | UploaderError::Http { .. }
                | UploaderError::UploadRejected(_)
                | UploaderError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, UploaderError>;
