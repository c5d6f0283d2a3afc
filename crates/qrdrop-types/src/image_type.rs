use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An image format the service accepts.
///
/// This is the whole allow-set: anything that does not map to one of these
/// variants is refused at the upload gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    WebP,
}

impl ImageType {
    /// Every accepted type, in display order.
    pub const ALL: [ImageType; 4] = [Self::Png, Self::Jpeg, Self::Gif, Self::WebP];

    /// The canonical MIME type served back to clients.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    /// File extension used by the disk backend.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }

    /// Look up a type from a MIME string.
    ///
    /// Parameters (`; charset=...`) are ignored, matching is case-insensitive,
    /// and the common non-standard `image/jpg` alias is accepted.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Look up a type from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Human-readable list of accepted extensions, as shown in rejection messages.
    pub fn allowed_extensions() -> &'static str {
        "png, jpg, jpeg, gif, webp"
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for ImageType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mime(s).ok_or_else(|| TypeError::UnsupportedType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_lookup_is_case_insensitive_and_ignores_params() {
        assert_eq!(ImageType::from_mime("IMAGE/PNG"), Some(ImageType::Png));
        assert_eq!(
            ImageType::from_mime("image/jpeg; charset=binary"),
            Some(ImageType::Jpeg)
        );
        assert_eq!(ImageType::from_mime("image/jpg"), Some(ImageType::Jpeg));
    }

    #[test]
    fn unknown_mime_is_rejected() {
        assert_eq!(ImageType::from_mime("image/tiff"), None);
        assert_eq!(ImageType::from_mime("application/octet-stream"), None);
        assert_eq!(ImageType::from_mime(""), None);
        assert!("image/bmp".parse::<ImageType>().is_err());
    }

    #[test]
    fn every_type_maps_back_from_its_mime() {
        for ty in ImageType::ALL {
            assert_eq!(ImageType::from_mime(ty.mime()), Some(ty));
            assert_eq!(ImageType::from_extension(ty.extension()), Some(ty));
        }
    }

    #[test]
    fn display_is_mime() {
        assert_eq!(ImageType::WebP.to_string(), "image/webp");
    }
}
