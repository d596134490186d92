//! Error types for the multilevel gain-medium core.
//!
//! This module provides a unified error type [`MultilevelError`]. Most variants
//! are validation failures: the host handed the core a malformed transition
//! table, a singular relaxation operator or mismatched arrays, and can decide
//! whether that is recoverable. [`MultilevelError::InvariantViolated`] is the
//! exception and signals a bug in the core or in the host's bookkeeping.

use std::fmt;

use thiserror::Error;

use crate::grid::Component;

/// Result type alias using [`MultilevelError`].
pub type Result<T> = std::result::Result<T, MultilevelError>;

/// Which coupling table a transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Column of `alpha`, coupled to the field through a polarization.
    Radiative,
    /// Column of `beta`, coupled only through density-matrix coherence.
    NonRadiative,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Radiative => write!(f, "radiative"),
            TransitionKind::NonRadiative => write!(f, "non-radiative"),
        }
    }
}

/// Unified error type for all multilevel operations.
#[derive(Error, Debug)]
pub enum MultilevelError {
    // ============ Linear Algebra Errors ============
    /// Matrix is numerically singular and cannot be inverted
    #[error("Singular matrix - LU factorization hit a zero pivot")]
    SingularMatrix,

    /// I + Gamma*dt/2 is singular for this timestep
    #[error("Relaxation matrix I + Gamma*dt/2 is singular at dt = {dt:.3e} - invalid configuration")]
    SingularRelaxation { dt: f64 },

    // ============ Transition Table Errors ============
    /// A coupling column without exactly one upper and one lower level
    #[error("Invalid transition definition: {kind} transition {index}: {message}")]
    InvalidTransition {
        kind: TransitionKind,
        index: usize,
        message: String,
    },

    /// Two levels that must be connected by a transition are not
    #[error("Inconsistent transition table: no radiative or non-radiative transition connects levels {first} and {second}")]
    InconsistentTransitionTable { first: usize, second: usize },

    // ============ Material Errors ============
    /// Off-diagonal saturation profile on a polarized component
    #[error("Anisotropic (off-diagonal) saturable gain on component {component} is unsupported")]
    UnsupportedAnisotropicGain { component: Component },

    /// Invalid model parameter
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // ============ Geometry Errors ============
    /// Array length does not match what the model or grid expects
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid grid volume
    #[error("Invalid grid volume: {message}")]
    InvalidGrid { message: String },

    // ============ Internal Errors ============
    /// Should never happen; indicates a bug rather than bad input
    #[error("Internal invariant violated: {message}")]
    InvariantViolated { message: String },
}

impl MultilevelError {
    /// Create an invalid transition error
    pub fn invalid_transition(kind: TransitionKind, index: usize, message: impl Into<String>) -> Self {
        Self::InvalidTransition {
            kind,
            index,
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolated {
            message: message.into(),
        }
    }

    /// Whether this error is a bug-class invariant violation rather than bad input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = MultilevelError::invalid_transition(TransitionKind::Radiative, 2, "no upper level");
        let msg = err.to_string();
        assert!(msg.contains("Invalid transition definition"));
        assert!(msg.contains("radiative transition 2"));
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn test_invariant_is_distinguished() {
        let err = MultilevelError::invariant("too many polarization components");
        assert!(err.is_invariant_violation());
        assert!(err.to_string().starts_with("Internal invariant violated"));
    }
}
