//! Image node payload for pasted raster images.

use crate::board::{BoardError, BoardResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect format from a MIME type such as `image/png`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// A pasted image, stored inline as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageNodeData {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl ImageNodeData {
    /// Encode raw image bytes as a data URL.
    pub fn from_bytes(data: &[u8], format: ImageFormat) -> Self {
        Self::with_mime(data, format.mime_type())
    }

    /// Encode bytes under a declared MIME type, for image types without a
    /// known [`ImageFormat`].
    pub fn with_mime(data: &[u8], mime: &str) -> Self {
        Self {
            src: format!("data:{};base64,{}", mime, STANDARD.encode(data)),
            alt: None,
        }
    }

    /// MIME type and raw bytes of an inline `data:` source.
    pub fn decode(&self) -> BoardResult<(String, Vec<u8>)> {
        let rest = self
            .src
            .strip_prefix("data:")
            .ok_or_else(|| BoardError::InvalidImage("source is not a data URL".to_string()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| BoardError::InvalidImage("data URL has no payload".to_string()))?;
        let mime = meta
            .strip_suffix(";base64")
            .ok_or_else(|| BoardError::InvalidImage("data URL is not base64".to_string()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| BoardError::InvalidImage(e.to_string()))?;
        Ok((mime.to_string(), bytes))
    }

    /// Format of the inline data, from its bytes or declared MIME type.
    pub fn format(&self) -> Option<ImageFormat> {
        let (mime, bytes) = self.decode().ok()?;
        ImageFormat::from_magic_bytes(&bytes).or_else(|| ImageFormat::from_mime(&mime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_data_url() {
        let image = ImageNodeData::from_bytes(&PNG_MAGIC, ImageFormat::Png);
        assert!(image.src.starts_with("data:image/png;base64,"));
        let (mime, bytes) = image.decode().unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, PNG_MAGIC);
        assert_eq!(image.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn test_decode_rejects_remote_url() {
        let image = ImageNodeData {
            src: "https://example.com/a.png".into(),
            alt: None,
        };
        assert!(matches!(image.decode(), Err(BoardError::InvalidImage(_))));
        assert_eq!(image.format(), None);
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_magic_bytes(b"hello"), None);
    }

    #[test]
    fn test_from_mime() {
        assert_eq!(ImageFormat::from_mime("IMAGE/JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime("text/plain"), None);
    }
}
