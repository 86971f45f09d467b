//! Network access for the converter.
//!
//! The converter only sees [`ImageFetcher`], so tests swap the HTTP client
//! for [`MockImageFetcher`].

mod http;
mod mock;

use async_trait::async_trait;

pub use http::HttpImageFetcher;
pub use mock::MockImageFetcher;

use crate::ConversionError;

/// A successful (2xx) response body and its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn new(content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches the locator anonymously.
    ///
    /// Non-success statuses are returned as [`ConversionError::Status`].
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ConversionError>;
}

#[async_trait]
impl<T: ImageFetcher + ?Sized> ImageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ConversionError> {
        (**self).fetch(url).await
    }
}
