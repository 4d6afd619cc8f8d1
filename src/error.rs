use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeafDoctorError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。環境変数 GROQ_API_KEY を設定するか `leaf-doctor config --set-api-key YOUR_KEY` を実行してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("対応していない画像形式です: {0}")]
    UnsupportedFormat(String),

    #[error("画像データが不正です: {0}")]
    InvalidImagePayload(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("サーバーエラー: {0}")]
    Server(String),

    #[error(transparent)]
    Common(#[from] leaf_doctor_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl LeafDoctorError {
    /// 呼び出し側の入力に起因するエラーか
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LeafDoctorError::InvalidImagePayload(_)
                | LeafDoctorError::ImageLoad(_)
                | LeafDoctorError::UnsupportedFormat(_)
        )
    }

    /// 外部API側のエラーか
    pub fn is_upstream_error(&self) -> bool {
        matches!(self, LeafDoctorError::ApiCall(_))
    }
}

pub type Result<T> = std::result::Result<T, LeafDoctorError>;
