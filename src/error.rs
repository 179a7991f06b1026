use thiserror::Error;

/// Errors the anonymization pipeline can surface.
///
/// Model and weights failures are startup-fatal: a process that cannot load
/// its detectors should not serve traffic. Decode failures are caller input
/// problems. Nothing in the pipeline retries — detection and obfuscation are
/// deterministic over valid input.
#[derive(Debug, Error)]
pub enum AnonymizeError {
    /// A detector backend could not load its model. Fatal at startup.
    #[error("failed to load detection model: {0}")]
    ModelLoad(String),

    /// Weights could not be resolved, fetched, or verified. Fatal at startup.
    #[error("model weights unavailable: {0}")]
    WeightsUnavailable(String),

    /// Caller-supplied bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Re-encoding the output image failed.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// Input format with no matching output encoder.
    #[error("unsupported image format")]
    UnsupportedFormat,

    /// Gaussian kernel size was zero or even.
    #[error("kernel size must be a positive odd integer, got {0}")]
    InvalidKernelSize(u32),

    /// Gaussian sigma was zero, negative, or non-finite.
    #[error("sigma must be positive and finite, got {0}")]
    InvalidSigma(f32),

    /// Box kernel size was zero.
    #[error("box kernel size must be > 0")]
    InvalidBoxKernelSize,
}
