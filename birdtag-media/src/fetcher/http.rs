use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use super::{FetchedImage, ImageFetcher};
use crate::{ConversionError, ConverterSettings};

const MAX_PREALLOCATION: u64 = 8 * 1024 * 1024;
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

/// Fetches images over HTTP(S) with reqwest.
///
/// Requests carry no cookies or credentials. Redirects follow reqwest's
/// default policy.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: Client,
    max_image_bytes: Option<u64>,
}

impl HttpImageFetcher {
    pub fn new(settings: &ConverterSettings) -> Result<Self, ConversionError> {
        let mut builder = Client::builder().user_agent(settings.user_agent.as_str());
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = settings.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ConversionError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, settings.max_image_bytes))
    }

    pub fn with_client(client: Client, max_image_bytes: Option<u64>) -> Self {
        Self {
            client,
            max_image_bytes,
        }
    }

    fn check_size(&self, size: u64) -> Result<(), ConversionError> {
        match self.max_image_bytes {
            Some(limit) if size > limit => Err(ConversionError::TooLarge { size, limit }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ConversionError> {
        let mut response = self
            .client
            .get(url)
            .header(header::ACCEPT, IMAGE_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConversionError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let expected_size = response.content_length().unwrap_or(0);
        self.check_size(expected_size)?;

        let mut bytes = Vec::with_capacity(expected_size.min(MAX_PREALLOCATION) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ConversionError::Body(e.to_string()))?
        {
            self.check_size((bytes.len() + chunk.len()) as u64)?;
            bytes.extend_from_slice(&chunk);
        }

        debug!(
            url,
            status = status.as_u16(),
            size = bytes.len(),
            content_type = content_type.as_deref().unwrap_or_default(),
            "Fetched resource"
        );

        Ok(FetchedImage {
            content_type,
            bytes,
        })
    }
}
