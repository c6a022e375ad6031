use thiserror::Error;

#[derive(Debug, Error)]
pub enum StievieError {
    /// Bad credentials, an unsuccessful login payload, or a session the
    /// backend no longer honors.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The backend answered with a non-200 application response code.
    #[error("api error: {context} ({code})")]
    Api { code: i64, context: &'static str },

    /// A program guide referenced a lookup-table entry that does not exist.
    #[error("guide lookup: {table} index `{value}` invalid for {len} entries")]
    GuideIndex {
        table: &'static str,
        value: String,
        len: usize,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StievieError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Application-level failures: non-200 response codes and guide
    /// data-integrity errors.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::GuideIndex { .. })
    }
}
