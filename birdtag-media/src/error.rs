use thiserror::Error;

/// Reasons a locator could not be turned into a data URL.
///
/// [`DataUrlConverter::convert`](crate::DataUrlConverter::convert) absorbs all of
/// these into `None`; use `try_convert` when the cause matters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("invalid locator: {0}")]
    InvalidLocator(String),
    #[error("image failed to load: {0}")]
    ImageLoad(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("HTTP error, status code: {0}")]
    Status(u16),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("image too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

impl ConversionError {
    pub fn image_load(msg: impl Into<String>) -> Self {
        Self::ImageLoad(msg.into())
    }

    /// Any failure during the preflight image check surfaces as a load error.
    pub(crate) fn into_image_load(self) -> Self {
        match self {
            Self::ImageLoad(_) => self,
            other => Self::ImageLoad(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ConversionError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return ConversionError::Status(status.as_u16());
        }
        if e.is_body() || e.is_decode() {
            return ConversionError::Body(e.to_string());
        }
        ConversionError::Network(e.to_string())
    }
}

/// Errors from parsing a `data:` URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("missing `data:` prefix")]
    MissingPrefix,
    #[error("missing `,` between header and payload")]
    MissingComma,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}
