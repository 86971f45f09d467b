use url::Url;

use crate::ConversionError;

const THUMBNAIL_SEGMENT: &str = "Thumbnails/";
const FULL_IMAGE_SEGMENT: &str = "Images/";

/// Parses a network locator, accepting only absolute http(s) URLs.
pub fn parse_locator(reference: &str) -> Result<Url, ConversionError> {
    let url = Url::parse(reference.trim())
        .map_err(|e| ConversionError::InvalidLocator(format!("{reference}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConversionError::InvalidLocator(format!(
            "unsupported scheme `{scheme}`"
        ))),
    }
}

/// Maps a thumbnail locator to the locator of its full-size image.
///
/// Thumbnails are stored under a `Thumbnails/` prefix next to the originals
/// under `Images/`. The input may arrive form-encoded from a query string.
pub fn full_image_url(thumbnail_url: &str) -> String {
    let plus_decoded = thumbnail_url.replace('+', " ");
    let decoded = urlencoding::decode_binary(plus_decoded.as_bytes());
    String::from_utf8_lossy(&decoded).replace(THUMBNAIL_SEGMENT, FULL_IMAGE_SEGMENT)
}
