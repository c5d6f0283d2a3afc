use std::time::Duration;

use qrdrop_types::ImageType;

use crate::error::GateError;
use crate::rejection::Rejection;

// ---------------------------------------------------------------------------
// UploadCandidate
// ---------------------------------------------------------------------------

/// An upload waiting for a decision.
///
/// Only the bytes and the client's declared MIME type are considered. File
/// names are deliberately absent: they are never trusted for type detection.
#[derive(Clone, Copy, Debug)]
pub struct UploadCandidate<'a> {
    /// The raw payload as received.
    pub bytes: &'a [u8],
    /// `Content-Type` the client declared for the part, if any.
    pub declared_type: Option<&'a str>,
}

impl<'a> UploadCandidate<'a> {
    pub fn new(bytes: &'a [u8], declared_type: Option<&'a str>) -> Self {
        Self {
            bytes,
            declared_type,
        }
    }
}

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// The outcome of a single gate stage evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// The stage passed; proceed to the next stage.
    Pass,
    /// The stage refused the upload.
    Reject(Rejection),
}

impl StageDecision {
    /// Returns `true` if the decision is `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    /// Name of the stage that produced this result.
    pub stage_name: String,
    /// Whether the stage passed.
    pub passed: bool,
    /// Log-oriented reason, populated on rejection.
    pub reason: Option<String>,
    /// Wall-clock time the stage took to evaluate.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// GateContext
// ---------------------------------------------------------------------------

/// State shared between the stages of one evaluation.
#[derive(Debug, Default)]
pub struct GateContext {
    /// The image type established by content sniffing (or, failing that, the
    /// declared type). Later stages decode against this.
    pub resolved_type: Option<ImageType>,
    /// Results from stages that have already run in this evaluation.
    pub previous_stages: Vec<StageResult>,
}

// ---------------------------------------------------------------------------
// GateStage trait
// ---------------------------------------------------------------------------

/// A single evaluation stage in the gate pipeline.
///
/// Stages are evaluated in order and may record what they learn in the
/// shared context. The trait is object-safe and `Send + Sync` so stages can
/// be stored in a `Vec<Box<dyn GateStage>>`.
pub trait GateStage: Send + Sync {
    /// Human-readable name of this stage (e.g., "size", "decode").
    fn name(&self) -> &str;

    /// Evaluate the candidate and return a decision.
    fn evaluate(
        &self,
        candidate: &UploadCandidate<'_>,
        context: &mut GateContext,
    ) -> Result<StageDecision, GateError>;
}
