use std::fmt;
use thiserror::Error as ThisError;

///
/// ExecError
/// Structured query-execution error with a stable internal classification.
/// Not a stable wire format; the `message` text (and, for
/// `unsupported_function`, its exact shape) is part of the observable
/// contract and must not be reworded casually.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct ExecError {
    pub class: ExecErrorClass,
    pub origin: ExecErrorOrigin,
    pub message: String,
}

impl ExecError {
    pub fn new(class: ExecErrorClass, origin: ExecErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Build the exact error string required by the external iterator
    /// contract: `unsupported <fn> iterator type: <iterator type name>`.
    #[must_use]
    pub fn unsupported_function(function: &str, type_name: &str) -> Self {
        Self::new(
            ExecErrorClass::Unsupported,
            ExecErrorOrigin::Construction,
            format!("unsupported {function} iterator type: {type_name}"),
        )
    }

    #[must_use]
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::new(ExecErrorClass::InvalidOptions, ExecErrorOrigin::Planner, message)
    }

    #[must_use]
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ExecErrorClass::TypeMismatch, ExecErrorOrigin::Expression, message)
    }

    #[must_use]
    pub fn internal(origin: ExecErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ExecErrorClass::Internal, origin, message)
    }

    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(self.origin, ExecErrorOrigin::Construction | ExecErrorOrigin::Planner)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ExecErrorClass
/// Error taxonomy for runtime classification. Not a stable API.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecErrorClass {
    Unsupported,
    InvalidOptions,
    TypeMismatch,
    Internal,
}

impl fmt::Display for ExecErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unsupported => "unsupported",
            Self::InvalidOptions => "invalid_options",
            Self::TypeMismatch => "type_mismatch",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ExecErrorOrigin
/// Origin taxonomy for runtime classification. Not a stable API.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecErrorOrigin {
    Construction,
    Planner,
    Iterator,
    Expression,
}

impl fmt::Display for ExecErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Construction => "construction",
            Self::Planner => "planner",
            Self::Iterator => "iterator",
            Self::Expression => "expression",
        };
        write!(f, "{label}")
    }
}
