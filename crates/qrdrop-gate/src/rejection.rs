use qrdrop_types::ImageType;

const MIB: u64 = 1024 * 1024;

/// Why an upload was refused.
///
/// The `Display` form is for logs. Clients only ever see
/// [`Rejection::user_message`], which never carries decoder output or other
/// internal detail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The payload is larger than the configured maximum.
    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// The content is not one of the accepted image types.
    #[error("unsupported type: {found}")]
    UnsupportedType { found: String },

    /// The content claims an accepted type but does not decode as one.
    #[error("invalid image: {detail}")]
    InvalidImage { detail: String },
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "TooLarge",
            Self::UnsupportedType { .. } => "UnsupportedType",
            Self::InvalidImage { .. } => "InvalidImage",
        }
    }

    /// Message safe to show to the uploader.
    pub fn user_message(&self) -> String {
        match self {
            Self::TooLarge { limit, .. } if *limit >= MIB => {
                format!("File size exceeds {}MB limit.", limit / MIB)
            }
            Self::TooLarge { limit, .. } => format!("File size exceeds {limit} byte limit."),
            Self::UnsupportedType { .. } => format!(
                "Invalid file type. Allowed: {}",
                ImageType::allowed_extensions()
            ),
            Self::InvalidImage { .. } => "Invalid image file.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_message_uses_megabytes() {
        let r = Rejection::TooLarge {
            size: 15 * MIB,
            limit: 10 * MIB,
        };
        assert_eq!(r.user_message(), "File size exceeds 10MB limit.");
        assert_eq!(r.code(), "TooLarge");
    }

    #[test]
    fn small_limits_are_reported_in_bytes() {
        let r = Rejection::TooLarge { size: 600, limit: 512 };
        assert_eq!(r.user_message(), "File size exceeds 512 byte limit.");
    }

    #[test]
    fn invalid_image_hides_decoder_detail() {
        let r = Rejection::InvalidImage {
            detail: "Format error decoding Png: CRC error at /tmp/x".into(),
        };
        assert_eq!(r.user_message(), "Invalid image file.");
        assert!(r.to_string().contains("CRC error"));
    }

    #[test]
    fn unsupported_type_lists_allowed_extensions() {
        let r = Rejection::UnsupportedType {
            found: "image/bmp".into(),
        };
        assert_eq!(
            r.user_message(),
            "Invalid file type. Allowed: png, jpg, jpeg, gif, webp"
        );
    }
}
