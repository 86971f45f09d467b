use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::DataUrlError;

pub const DATA_URL_PREFIX: &str = "data:";
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Media type implied by a `data:` URL without one (RFC 2397).
const IMPLIED_MEDIA_TYPE: &str = "text/plain;charset=US-ASCII";

/// Returns true if the reference is already an embedded `data:` URL.
///
/// The check is an exact prefix match, so it never touches the payload.
pub fn is_data_url(reference: &str) -> bool {
    reference.starts_with(DATA_URL_PREFIX)
}

/// Binary content together with the media type it should be embedded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl DataUrl {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Parses `data:[<mediatype>][;base64],<payload>`.
    ///
    /// Base64 payloads may contain ASCII whitespace; anything else is
    /// percent-decoded.
    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        let rest = input
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or(DataUrlError::MissingPrefix)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingComma)?;

        let (header, is_base64) = match header.rsplit_once(';') {
            Some((head, marker)) if marker.trim().eq_ignore_ascii_case("base64") => (head, true),
            _ => (header, false),
        };

        let header = header.trim();
        let media_type = if header.is_empty() {
            IMPLIED_MEDIA_TYPE.to_string()
        } else if header.starts_with(';') {
            format!("text/plain{header}")
        } else {
            header.to_string()
        };

        let data = if is_base64 {
            let compact: String = payload
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| DataUrlError::InvalidBase64(e.to_string()))?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        Ok(Self { media_type, data })
    }

    /// The media type without parameters, e.g. `image/png`.
    pub fn essence(&self) -> &str {
        self.media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let media_type = if self.media_type.trim().is_empty() {
            DEFAULT_MEDIA_TYPE
        } else {
            self.media_type.as_str()
        };
        write!(
            f,
            "{DATA_URL_PREFIX}{media_type};base64,{}",
            STANDARD.encode(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_data_urls_by_exact_prefix() {
        assert!(is_data_url("data:image/png;base64,AAAA"));
        assert!(is_data_url("data:,hello"));
        assert!(!is_data_url("https://example.com/data:image"));
        assert!(!is_data_url("DATA:image/png;base64,AAAA"));
        assert!(!is_data_url(""));
    }

    #[test]
    fn formats_with_media_type_and_base64_marker() {
        let url = DataUrl::new("image/png", vec![0x89, b'P', b'N', b'G']);
        assert_eq!(url.to_string(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn empty_media_type_falls_back_to_octet_stream() {
        let url = DataUrl::new("", b"hi".to_vec());
        assert_eq!(url.to_string(), "data:application/octet-stream;base64,aGk=");
    }

    #[test]
    fn parses_base64_payload() {
        let url = DataUrl::parse("data:image/gif;base64,R0lGODlh").unwrap();
        assert_eq!(url.media_type, "image/gif");
        assert_eq!(url.data, b"GIF89a");
    }

    #[test]
    fn parses_base64_marker_case_insensitively_and_ignores_whitespace() {
        let url = DataUrl::parse("data:image/gif;BASE64,R0lG\nODlh").unwrap();
        assert_eq!(url.data, b"GIF89a");
    }

    #[test]
    fn parses_percent_encoded_payload() {
        let url = DataUrl::parse("data:text/plain;charset=utf-8,bird%20tag").unwrap();
        assert_eq!(url.media_type, "text/plain;charset=utf-8");
        assert_eq!(url.essence(), "text/plain");
        assert_eq!(url.data, b"bird tag");
    }

    #[test]
    fn missing_media_type_is_implied_text_plain() {
        let url = DataUrl::parse("data:,hello").unwrap();
        assert_eq!(url.media_type, "text/plain;charset=US-ASCII");

        let url = DataUrl::parse("data:;charset=utf-8,hello").unwrap();
        assert_eq!(url.media_type, "text/plain;charset=utf-8");
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            DataUrl::parse("https://example.com/a.png"),
            Err(DataUrlError::MissingPrefix)
        );
        assert_eq!(
            DataUrl::parse("data:image/png;base64"),
            Err(DataUrlError::MissingComma)
        );
        assert!(matches!(
            DataUrl::parse("data:image/png;base64,@@@"),
            Err(DataUrlError::InvalidBase64(_))
        ));
    }

    #[test]
    fn decoding_a_formatted_url_returns_the_original_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let encoded = DataUrl::new("image/jpeg", bytes.clone()).to_string();

        let decoded = DataUrl::parse(&encoded).unwrap();
        assert_eq!(decoded.media_type, "image/jpeg");
        assert_eq!(decoded.data, bytes);
    }
}
