use crate::error::GateError;
use crate::rejection::Rejection;
use crate::stage::{GateContext, GateStage, StageDecision, UploadCandidate};
use crate::stages::kind::to_codec;

/// Fully decodes the payload as the resolved type.
///
/// A matching header is not enough: truncated or corrupt bodies are refused
/// here. The decoded pixels are discarded; the stored bytes are always the
/// original payload.
pub struct DecodeStage;

impl GateStage for DecodeStage {
    fn name(&self) -> &str {
        "decode"
    }

    fn evaluate(
        &self,
        candidate: &UploadCandidate<'_>,
        context: &mut GateContext,
    ) -> Result<StageDecision, GateError> {
        let ty = context
            .resolved_type
            .ok_or_else(|| GateError::stage(self.name(), "no image type resolved before decode"))?;

        match image::load_from_memory_with_format(candidate.bytes, to_codec(ty)) {
            Ok(_) => Ok(StageDecision::Pass),
            Err(e) => Ok(StageDecision::Reject(Rejection::InvalidImage {
                detail: e.to_string(),
            })),
        }
    }
}
