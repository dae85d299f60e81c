//! `data:` URL parsing for image uploads.
//!
//! The product form sends the picked image as `data:<type>;base64,<payload>`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::GatewayError;

/// Decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, `text/plain` when the URL omits it.
    pub content_type: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a `data:` URL, base64 or percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidDataUrl`] if the input is not a
    /// `data:` URL or its payload cannot be decoded.
    pub fn parse(input: &str) -> Result<Self, GatewayError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| GatewayError::InvalidDataUrl("missing data: prefix".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| GatewayError::InvalidDataUrl("missing payload".to_string()))?;

        let (media_type, is_base64) = match header.strip_suffix(";base64") {
            Some(media_type) => (media_type, true),
            None => (header, false),
        };

        let bytes = if is_base64 {
            let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map_err(|e| GatewayError::InvalidDataUrl(e.to_string()))?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };

        if bytes.is_empty() {
            return Err(GatewayError::InvalidDataUrl("empty payload".to_string()));
        }

        // Parameters such as ";charset=utf-8" are not part of the content type.
        let content_type = media_type.split(';').next().unwrap_or_default().trim();
        let content_type = if content_type.is_empty() {
            "text/plain".to_string()
        } else {
            content_type.to_ascii_lowercase()
        };

        Ok(Self {
            content_type,
            bytes,
        })
    }

    /// Whether the payload declares an image media type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}
