//! Contains the error type returned by the fallible parts of the crate.

/// The errors that can surface from building or running a template pipeline.
///
/// Conditions with a defined local fallback (a cluster count above the number of distinct
/// colors, a prunable component without neighbors, a label that could not be sampled inside
/// its shape) are not errors. They are handled in place and reported through `tracing`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PbnError {
    /// The input pixel buffer cannot be interpreted as an image.
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// A configuration value is outside of its supported range.
    #[error("invalid value {value} for option `{option}`")]
    InvalidOption {
        /// The name of the offending option.
        option: &'static str,
        /// The rejected value.
        value: f64,
    },
}
