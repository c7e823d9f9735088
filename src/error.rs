use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Ranking was asked for something the score vector cannot satisfy.
    InvalidArgument(String),
    /// Every constraint set in the fallback chain was rejected.
    DeviceUnavailable { attempts: usize, last_error: String },
    /// A single frame failed somewhere between capture and classification.
    TransientFrame(String),
    /// The loop gave up. Returned from `CaptureHandle::join`.
    FatalPipeline(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            PipelineError::DeviceUnavailable {
                attempts,
                last_error,
            } => write!(
                f,
                "camera unavailable after {attempts} attempts: {last_error}"
            ),
            PipelineError::TransientFrame(msg) => write!(f, "frame skipped: {msg}"),
            PipelineError::FatalPipeline(msg) => write!(f, "pipeline stopped: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl PipelineError {
    /// Classifiers signal an unrecoverable fault by returning this variant
    /// through their boxed error.
    pub fn is_fatal(err: &(dyn std::error::Error + Send + Sync + 'static)) -> bool {
        matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::FatalPipeline(_))
        )
    }
}
