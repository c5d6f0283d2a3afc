use std::time::{Duration, Instant};

use qrdrop_types::ImageType;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::rejection::Rejection;
use crate::stage::{GateContext, GateStage, StageDecision, StageResult, UploadCandidate};
use crate::stages::{DecodeStage, SizeStage, TypeStage};

// ---------------------------------------------------------------------------
// Verdict / GateResult
// ---------------------------------------------------------------------------

/// Final decision for one upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every stage passed; the payload is an image of this type.
    Accepted(ImageType),
    /// A stage refused the payload.
    Rejected(Rejection),
}

/// The outcome of running an upload through the full gate pipeline.
#[derive(Clone, Debug)]
pub struct GateResult {
    /// The final decision.
    pub verdict: Verdict,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Total wall-clock time for the pipeline evaluation.
    pub elapsed: Duration,
}

impl GateResult {
    /// Returns `true` if the upload was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self.verdict, Verdict::Accepted(_))
    }

    /// Collapse into the accepted type or the rejection.
    pub fn into_verdict(self) -> Result<ImageType, Rejection> {
        match self.verdict {
            Verdict::Accepted(ty) => Ok(ty),
            Verdict::Rejected(r) => Err(r),
        }
    }
}

// ---------------------------------------------------------------------------
// UploadGate
// ---------------------------------------------------------------------------

/// The upload gate: a pipeline of stages that every payload must pass
/// through before the store sees it.
///
/// Evaluation has no side effects. Nothing is allocated in the store until a
/// caller acts on an `Accepted` verdict.
pub struct UploadGate {
    stages: Vec<Box<dyn GateStage>>,
    config: GateConfig,
}

impl UploadGate {
    /// Create a new gate with the given configuration.
    ///
    /// Starts with an empty pipeline. Use [`Self::add_stage`] to add stages,
    /// or [`Self::with_default_stages`] for the standard pipeline.
    pub fn new(config: GateConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Create a gate with the default stage pipeline:
    /// Size -> Type -> Decode
    pub fn with_default_stages(config: GateConfig) -> Self {
        let mut gate = Self::new(config);
        gate.add_stage(Box::new(SizeStage::new(gate.config.max_upload_bytes)));
        gate.add_stage(Box::new(TypeStage));
        gate.add_stage(Box::new(DecodeStage));
        gate
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn GateStage>) {
        self.stages.push(stage);
    }

    /// The current configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Evaluate an upload through the full pipeline.
    ///
    /// The pipeline is **fail-fast**: the first stage that rejects stops
    /// evaluation. If all stages pass, some stage must have resolved the
    /// image type; a pipeline that never does is misconfigured.
    pub fn evaluate(&self, candidate: &UploadCandidate<'_>) -> Result<GateResult, GateError> {
        let pipeline_start = Instant::now();
        let mut context = GateContext::default();
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let decision = stage.evaluate(candidate, &mut context)?;

            let result = StageResult {
                stage_name: stage.name().to_string(),
                passed: decision.is_pass(),
                reason: match &decision {
                    StageDecision::Pass => None,
                    StageDecision::Reject(r) => Some(r.to_string()),
                },
                elapsed: stage_start.elapsed(),
            };
            stage_results.push(result.clone());
            context.previous_stages.push(result);

            if let StageDecision::Reject(rejection) = decision {
                tracing::debug!(
                    stage = stage.name(),
                    code = rejection.code(),
                    reason = %rejection,
                    "upload rejected"
                );
                return Ok(GateResult {
                    verdict: Verdict::Rejected(rejection),
                    stage_results,
                    elapsed: pipeline_start.elapsed(),
                });
            }
        }

        let ty = context.resolved_type.ok_or_else(|| {
            GateError::Config("pipeline accepted an upload without resolving its type".into())
        })?;

        Ok(GateResult {
            verdict: Verdict::Accepted(ty),
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }

    /// Shorthand for evaluating raw bytes and a declared MIME type.
    pub fn validate(
        &self,
        bytes: &[u8],
        declared_type: Option<&str>,
    ) -> Result<GateResult, GateError> {
        self.evaluate(&UploadCandidate::new(bytes, declared_type))
    }
}

impl Default for UploadGate {
    fn default() -> Self {
        Self::with_default_stages(GateConfig::default())
    }
}
