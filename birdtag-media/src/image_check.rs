//! Checks that fetched bytes are something a browser would render as an image.

use std::io::Cursor;

use image::{ImageError, ImageFormat, ImageReader};
use tracing::debug;

use crate::ConversionError;

/// How far into a text document we look for the `<svg` root element.
const SVG_SNIFF_BYTES: usize = 1024;

/// Guesses the raster format from the magic bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Media type for the sniffed content, if it is a recognised image.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if is_svg(bytes) {
        return Some("image/svg+xml");
    }
    sniff_format(bytes).map(|format| format.to_mime_type())
}

/// True if the document's root element is `<svg>`.
///
/// The XML declaration, comments and doctype before the root are skipped.
pub fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SVG_SNIFF_BYTES)];
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // A multi-byte character cut by the sniff window.
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&head[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
        Err(_) => return false,
    };

    root_element(text).is_some_and(|name| name == "svg" || name.ends_with(":svg"))
}

/// Name of the first element after the prolog.
fn root_element(text: &str) -> Option<&str> {
    let mut rest = text.trim_start_matches('\u{feff}');
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("<?") {
            rest = &after[after.find("?>")? + 2..];
        } else if let Some(after) = rest.strip_prefix("<!--") {
            rest = &after[after.find("-->")? + 3..];
        } else if let Some(after) = rest.strip_prefix("<!") {
            let close = match (after.find('['), after.find('>')) {
                (Some(open), Some(close)) if open < close => {
                    let subset_end = open + after[open..].find(']')?;
                    subset_end + after[subset_end..].find('>')?
                }
                (_, Some(close)) => close,
                _ => return None,
            };
            rest = &after[close + 1..];
        } else {
            let after = rest.strip_prefix('<')?;
            let end = after
                .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                .unwrap_or(after.len());
            return Some(&after[..end]);
        }
    }
}

/// Succeeds if the bytes decode to an image with non-zero dimensions.
///
/// Only the header is decoded; SVG documents are accepted as-is. Formats
/// recognised by signature but without a compiled-in decoder (AVIF) pass.
pub fn check_image(bytes: &[u8]) -> Result<(), ConversionError> {
    if bytes.is_empty() {
        return Err(ConversionError::image_load("empty response body"));
    }
    if is_svg(bytes) {
        return Ok(());
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ConversionError::image_load(e.to_string()))?;

    let Some(format) = reader.format() else {
        return Err(ConversionError::image_load("unrecognised image format"));
    };

    let (width, height) = match reader.into_dimensions() {
        Ok(dimensions) => dimensions,
        Err(ImageError::Unsupported(e)) => {
            debug!(?format, error = %e, "Accepting image by signature");
            return Ok(());
        }
        Err(e) => return Err(ConversionError::image_load(e.to_string())),
    };

    if width == 0 || height == 0 {
        return Err(ConversionError::image_load(format!(
            "image has empty dimensions {width}x{height}"
        )));
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::{encoded, png_bytes, AVIF_HEADER, SVG};
    use super::*;

    #[test]
    fn accepts_png() {
        assert!(check_image(&png_bytes()).is_ok());
        assert_eq!(sniff_format(&png_bytes()), Some(ImageFormat::Png));
        assert_eq!(sniff_media_type(&png_bytes()), Some("image/png"));
    }

    #[test]
    fn accepts_common_raster_formats() {
        for (format, media_type) in [
            (ImageFormat::Gif, "image/gif"),
            (ImageFormat::WebP, "image/webp"),
            (ImageFormat::Bmp, "image/bmp"),
        ] {
            let bytes = encoded(format);
            assert!(check_image(&bytes).is_ok(), "{format:?} rejected");
            assert_eq!(sniff_media_type(&bytes), Some(media_type));
        }

        let icon = encoded(ImageFormat::Ico);
        assert!(check_image(&icon).is_ok());
        assert_eq!(sniff_format(&icon), Some(ImageFormat::Ico));
    }

    #[test]
    fn accepts_avif_by_signature() {
        assert_eq!(sniff_format(AVIF_HEADER), Some(ImageFormat::Avif));
        assert!(check_image(AVIF_HEADER).is_ok());
        assert_eq!(sniff_media_type(AVIF_HEADER), Some("image/avif"));
    }

    #[test]
    fn accepts_svg() {
        assert!(is_svg(SVG.as_bytes()));
        assert!(check_image(SVG.as_bytes()).is_ok());
        assert_eq!(sniff_media_type(SVG.as_bytes()), Some("image/svg+xml"));
    }

    #[test]
    fn skips_prolog_before_svg_root() {
        let svg = "\u{feff}<?xml version=\"1.0\"?>\n<!-- Generator: Inkscape -->\n\
            <!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" [ <!ENTITY ns \"x\"> ]>\n\
            <svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        assert!(is_svg(svg.as_bytes()));
    }

    #[test]
    fn html_with_inline_svg_is_not_an_image() {
        let html = br#"<!DOCTYPE html><html><body><svg class="logo"><circle r="4"/></svg></body></html>"#;
        assert!(!is_svg(html));
        assert!(matches!(
            check_image(html),
            Err(ConversionError::ImageLoad(_))
        ));
    }

    #[test]
    fn svg_with_character_across_sniff_window_is_accepted() {
        let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg"><title>"#);
        while svg.len() < SVG_SNIFF_BYTES - 1 {
            svg.push('a');
        }
        svg.push('é');
        svg.push_str("</title></svg>");
        assert_eq!(&svg.as_bytes()[SVG_SNIFF_BYTES - 1..SVG_SNIFF_BYTES + 1], "é".as_bytes());

        assert!(is_svg(svg.as_bytes()));
        assert!(check_image(svg.as_bytes()).is_ok());
    }

    #[test]
    fn rejects_invalid_utf8_inside_the_window() {
        let mut bytes = b"<svg xmlns=\"http://www.w3.org/2000/svg\">".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"</svg>");
        assert!(!is_svg(&bytes));
    }

    #[test]
    fn rejects_html() {
        let html = b"<!DOCTYPE html><html><body>not found</body></html>";
        assert!(!is_svg(html));
        assert!(matches!(
            check_image(html),
            Err(ConversionError::ImageLoad(_))
        ));
    }

    #[test]
    fn rejects_empty_and_truncated_bodies() {
        assert!(matches!(check_image(&[]), Err(ConversionError::ImageLoad(_))));

        let png = png_bytes();
        assert!(matches!(
            check_image(&png[..8]),
            Err(ConversionError::ImageLoad(_))
        ));
    }
}
