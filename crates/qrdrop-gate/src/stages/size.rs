use crate::error::GateError;
use crate::rejection::Rejection;
use crate::stage::{GateContext, GateStage, StageDecision, UploadCandidate};

/// Refuses payloads above the configured ceiling.
pub struct SizeStage {
    max_bytes: u64,
}

impl SizeStage {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl GateStage for SizeStage {
    fn name(&self) -> &str {
        "size"
    }

    fn evaluate(
        &self,
        candidate: &UploadCandidate<'_>,
        _context: &mut GateContext,
    ) -> Result<StageDecision, GateError> {
        let size = candidate.bytes.len() as u64;
        if size > self.max_bytes {
            return Ok(StageDecision::Reject(Rejection::TooLarge {
                size,
                limit: self.max_bytes,
            }));
        }
        Ok(StageDecision::Pass)
    }
}
