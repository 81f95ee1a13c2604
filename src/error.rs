use thiserror::Error;

/// User-visible failure taxonomy. Every variant maps to a flash message and
/// a well-defined interactive state; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture device could not be obtained: no input device, the open
    /// was refused, or no usable stream config exists.
    #[error("capture unavailable: {0}")]
    CapabilityDenied(String),

    /// A capture session could not be finalized into a clip.
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    /// A chosen file was rejected; the widget keeps its prior state.
    #[error("{0}")]
    ValidationFailed(String),

    /// The submission request failed or the service answered non-success.
    #[error("submission failed: {0}")]
    TransportFailed(String),
}
