use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API returned error status: {status}")]
    ApiError { status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl SdkError {
    /// 连接失败和超时归为网络错误，其余保持原样
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SdkError::NetworkError(err.to_string())
        } else {
            SdkError::HttpError(err)
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
