//! Error types for the microsociety-learning crate.

/// Errors raised when building a learning policy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LearningError {
    /// A hyperparameter is outside its valid range.
    #[error("invalid learning parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in configuration.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Human-readable constraint that was violated.
        reason: &'static str,
    },

    /// A quantization level count is zero.
    #[error("quantization levels for {name} must be at least 1")]
    ZeroLevels {
        /// Which quantized dimension was misconfigured.
        name: &'static str,
    },
}
