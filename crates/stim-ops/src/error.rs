//! Error types for image operations.

use thiserror::Error;

/// Error type for image operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for image operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Checks that an interleaved buffer holds `width * height * channels` samples.
pub(crate) fn check_len(len: usize, width: usize, height: usize, channels: usize) -> OpsResult<()> {
    if width == 0 || height == 0 {
        return Err(OpsError::InvalidDimensions(format!(
            "empty image: {}x{}",
            width, height
        )));
    }
    let expected = width * height * channels;
    if len != expected {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} samples, got {}",
            expected, len
        )));
    }
    Ok(())
}
