use image::ImageFormat;
use qrdrop_types::ImageType;

use crate::error::GateError;
use crate::rejection::Rejection;
use crate::stage::{GateContext, GateStage, StageDecision, UploadCandidate};

/// Establishes the image type from the payload's magic bytes.
///
/// Sniffed content always wins over the declared type. The declared type is
/// only consulted when the bytes match no known signature, in which case an
/// allowed declaration is passed on to the decode stage to fail there.
pub struct TypeStage;

impl GateStage for TypeStage {
    fn name(&self) -> &str {
        "type"
    }

    fn evaluate(
        &self,
        candidate: &UploadCandidate<'_>,
        context: &mut GateContext,
    ) -> Result<StageDecision, GateError> {
        let declared = candidate.declared_type.and_then(ImageType::from_mime);

        match image::guess_format(candidate.bytes) {
            Ok(format) => match from_codec(format) {
                Some(sniffed) => {
                    if let Some(declared) = declared.filter(|d| *d != sniffed) {
                        tracing::debug!(
                            declared = %declared,
                            sniffed = %sniffed,
                            "declared type disagrees with content; using content"
                        );
                    }
                    context.resolved_type = Some(sniffed);
                    Ok(StageDecision::Pass)
                }
                None => Ok(StageDecision::Reject(Rejection::UnsupportedType {
                    found: format!("{format:?}"),
                })),
            },
            Err(_) => match declared {
                Some(claimed) => {
                    context.resolved_type = Some(claimed);
                    Ok(StageDecision::Pass)
                }
                None => Ok(StageDecision::Reject(Rejection::UnsupportedType {
                    found: candidate.declared_type.unwrap_or("unknown").to_string(),
                })),
            },
        }
    }
}

/// Map an accepted type onto the codec's format enum.
pub(crate) fn to_codec(ty: ImageType) -> ImageFormat {
    match ty {
        ImageType::Png => ImageFormat::Png,
        ImageType::Jpeg => ImageFormat::Jpeg,
        ImageType::Gif => ImageFormat::Gif,
        ImageType::WebP => ImageFormat::WebP,
    }
}

fn from_codec(format: ImageFormat) -> Option<ImageType> {
    match format {
        ImageFormat::Png => Some(ImageType::Png),
        ImageFormat::Jpeg => Some(ImageType::Jpeg),
        ImageFormat::Gif => Some(ImageType::Gif),
        ImageFormat::WebP => Some(ImageType::WebP),
        _ => None,
    }
}
