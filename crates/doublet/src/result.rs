//! Result and error types for Doublet.

use crate::object::Arity;
use crate::value::Value;
use std::fmt;
use thiserror::Error;

/// Result type for Doublet operations
pub type DoubleResult<T> = Result<T, DoubleError>;

/// Errors raised by the substitution engine
///
/// Every variant is raised synchronously at the point of violation and
/// is never swallowed by the engine.
#[derive(Debug, Error)]
pub enum DoubleError {
    /// Malformed call shape (empty method map, duplicate names, missing return value)
    #[error("Usage error: {message}")]
    Usage {
        /// Error message
        message: String,
    },

    /// Target does not resolve the method at any level
    #[error("undefined method `{method}' for {target}")]
    UnknownMethod {
        /// Target label
        target: String,
        /// Method name
        method: String,
    },

    /// A single-method stub scope ended without the method being called
    #[error("Expected `{method}' on {target} to be invoked, but it never was")]
    NotInvoked {
        /// Target label
        target: String,
        /// Method name
        method: String,
    },

    /// `unstub` named a method with no active substitution
    #[error("`{method}' on {target} is not stubbed")]
    NotStubbed {
        /// Target label
        target: String,
        /// Method name
        method: String,
    },

    /// An expectation was violated
    #[error("Expectation failed for `{method}' on {target}: {failure}")]
    Expectation {
        /// Target label
        target: String,
        /// Method name
        method: String,
        /// What diverged
        failure: ExpectationFailure,
    },

    /// A method was invoked with the wrong number of arguments
    #[error("wrong number of arguments for `{method}' (given {given}, expected {expected})")]
    Arity {
        /// Method name
        method: String,
        /// Declared arity
        expected: Arity,
        /// Arguments received
        given: usize,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl DoubleError {
    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// True for argument or call-count expectation failures
    #[must_use]
    pub fn is_expectation(&self) -> bool {
        matches!(self, Self::Expectation { .. })
    }
}

/// The reason an expectation did not hold
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectationFailure {
    /// Received arguments are not structurally equal to the expected ones
    Arguments {
        /// Declared arguments
        expected: Vec<Value>,
        /// Received arguments
        actual: Vec<Value>,
        /// First difference found by the matcher
        difference: String,
    },
    /// The method was called a different number of times than declared
    CallCount {
        /// Declared count constraint
        expected: String,
        /// Observed calls
        actual: usize,
    },
}

impl fmt::Display for ExpectationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arguments {
                expected,
                actual,
                difference,
            } => write!(
                f,
                "expected {}, got {} ({difference})",
                Value::List(expected.clone()),
                Value::List(actual.clone())
            ),
            Self::CallCount { expected, actual } => {
                write!(f, "expected to be called {expected}, was called {actual} time(s)")
            }
        }
    }
}
