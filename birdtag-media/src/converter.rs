//! Turns image locators into self-contained `data:` URLs.
//!
//! A conversion runs three dependent steps, each awaited in turn:
//!
//! 1. **Preflight** - load the locator as an image, so a broken or non-image
//!    resource fails before anything is encoded.
//! 2. **Fetch** - download the bytes to embed.
//! 3. **Encode** - base64 the body behind a `data:<media type>;base64,` header.
//!
//! References that are already `data:` URLs are returned untouched, so the
//! converter can be applied to its own output.
//!
//! # Example
//!
//! ```ignore
//! use birdtag_media::{ConverterSettings, DataUrlConverter};
//!
//! let converter = DataUrlConverter::from_settings(ConverterSettings::default())?;
//! if let Some(data_url) = converter.convert("https://birds.example.com/Images/crow.jpg").await {
//!     println!("{data_url}");
//! }
//! ```

use futures::StreamExt;
use tracing::{debug, error, instrument};

use crate::{
    data_url::{is_data_url, DataUrl, DATA_URL_PREFIX, DEFAULT_MEDIA_TYPE},
    locator::parse_locator,
    image_check::{check_image, sniff_media_type},
    ConversionError, ConverterSettings, FetchedImage, HttpImageFetcher, ImageFetcher,
};

/// Converter over any [`ImageFetcher`].
///
/// Holds no mutable state; concurrent calls are independent of each other.
pub struct DataUrlConverter<F>
where
    F: ImageFetcher,
{
    fetcher: F,
    settings: ConverterSettings,
}

impl DataUrlConverter<HttpImageFetcher> {
    /// Create a converter backed by a reqwest client built from `settings`.
    pub fn from_settings(settings: ConverterSettings) -> Result<Self, ConversionError> {
        let fetcher = HttpImageFetcher::new(&settings)?;
        Ok(Self::new(fetcher, settings))
    }
}

impl<F> DataUrlConverter<F>
where
    F: ImageFetcher,
{
    pub fn new(fetcher: F, settings: ConverterSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &ConverterSettings {
        &self.settings
    }

    /// Converts a reference, returning `None` on any failure.
    ///
    /// Failures are logged and never propagated.
    pub async fn convert(&self, reference: &str) -> Option<String> {
        match self.try_convert(reference).await {
            Ok(data_url) => Some(data_url),
            Err(e) => {
                error!(locator = %loggable(reference), error = %e, "Image conversion failed");
                None
            }
        }
    }

    /// Converts a reference, reporting why it failed.
    #[instrument(
        name = "DataUrlConverter::try_convert",
        skip(self, reference),
        fields(locator = %loggable(reference))
    )]
    pub async fn try_convert(&self, reference: &str) -> Result<String, ConversionError> {
        if is_data_url(reference) {
            debug!("Reference is already a data URL");
            return Ok(reference.to_string());
        }

        let url = parse_locator(reference)?;

        if self.settings.preflight {
            self.preflight(url.as_str()).await?;
        }

        let fetched = self.fetcher.fetch(url.as_str()).await?;
        if !self.settings.preflight {
            check_image(&fetched.bytes)?;
        }

        let media_type = media_type_for(&fetched);
        debug!(media_type = %media_type, size = fetched.bytes.len(), "Encoding image");

        Ok(DataUrl::new(media_type, fetched.bytes).to_string())
    }

    /// Converts many references concurrently.
    ///
    /// Output order matches input order; at most `max_concurrent_requests`
    /// conversions are in flight at once.
    pub async fn convert_all<I, S>(&self, references: I) -> Vec<Option<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let limit = self.settings.max_concurrent_requests.max(1);

        futures::stream::iter(references)
            .map(|reference| async move { self.convert(reference.as_ref()).await })
            .buffered(limit)
            .collect()
            .await
    }

    async fn preflight(&self, url: &str) -> Result<(), ConversionError> {
        let fetched = self
            .fetcher
            .fetch(url)
            .await
            .map_err(ConversionError::into_image_load)?;
        check_image(&fetched.bytes)?;
        debug!("Preflight image check passed");
        Ok(())
    }
}

/// Declared content type essence, else the sniffed image type, else octet-stream.
fn media_type_for(fetched: &FetchedImage) -> String {
    fetched
        .content_type
        .as_deref()
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map(|m| m.essence_str().to_string())
        .or_else(|| sniff_media_type(&fetched.bytes).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string())
}

/// Keeps base64 payloads out of the logs.
fn loggable(reference: &str) -> &str {
    if is_data_url(reference) {
        DATA_URL_PREFIX
    } else {
        reference
    }
}
