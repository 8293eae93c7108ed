use std::{fmt, sync::Arc};

use crate::matchers::MatchResult;

/// The single error type for all castcheck operations.
///
/// Every fallible API returns `castcheck::Result<T>` (alias for
/// `Result<T, castcheck::Error>`). Only [`Error::Assertion`] carries text
/// generated by the matchers; every other variant is passed through with the
/// message it was created with.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("To use the broadcast matchers, the test-mode pub/sub backend must be active")]
    TestAdapterRequired,

    #[error("A recording is already active on this test adapter; nested recording is not supported")]
    NestedRecording,

    #[error("{0}")]
    Assertion(AssertionFailure),

    #[error("{0}")]
    Predicate(#[source] Arc<dyn std::error::Error + Send + Sync>),

    #[error("Failed to encode broadcast payload: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The matchers were used in a way they do not support.
    Usage,
    /// The test-mode backend is not installed.
    Configuration,
    /// A count or payload constraint was not satisfied.
    Assertion,
    /// A failure raised by caller code (the action or a custom predicate).
    Propagated,
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    pub(crate) fn predicate(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Error::Predicate(Arc::from(e))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TestAdapterRequired => ErrorKind::Configuration,
            Error::NestedRecording => ErrorKind::Usage,
            Error::Assertion(_) => ErrorKind::Assertion,
            Error::Predicate(_) | Error::Encode(_) | Error::External(_) => ErrorKind::Propagated,
        }
    }

    /// Returns the assertion failure, if this error is one.
    pub fn as_assertion(&self) -> Option<&AssertionFailure> {
        match self {
            Error::Assertion(failure) => Some(failure),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::TestAdapterRequired, Self::TestAdapterRequired) => true,
            (Self::NestedRecording, Self::NestedRecording) => true,
            (Self::Assertion(a), Self::Assertion(b)) => a == b,
            (Self::Predicate(a), Self::Predicate(b)) => Arc::ptr_eq(a, b),
            (Self::Encode(a), Self::Encode(b)) => Arc::ptr_eq(a, b),
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Encode(Arc::new(e))
    }
}

/// A failed broadcast expectation.
///
/// The message is what a test runner should print. The individual
/// [`MatchResult`]s stay available for programmatic inspection; for a
/// compound expectation only the failing members are included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    message: String,
    results: Vec<MatchResult>,
}

impl AssertionFailure {
    pub(crate) fn new(message: String, results: Vec<MatchResult>) -> Self {
        Self { message, results }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_message_is_fixed() {
        assert_eq!(
            Error::TestAdapterRequired.to_string(),
            "To use the broadcast matchers, the test-mode pub/sub backend must be active"
        );
        assert_eq!(Error::TestAdapterRequired.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn predicate_error_keeps_message_verbatim() {
        let err = Error::predicate("expected: zxcv\n     got: asdf".into());
        assert_eq!(err.to_string(), "expected: zxcv\n     got: asdf");
        assert_eq!(err.kind(), ErrorKind::Propagated);
    }

    #[test]
    fn predicate_error_exposes_source() {
        let err = Error::predicate("boom".into());
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
    }

    #[test]
    fn external_errors_compare_by_identity() {
        let io = std::io::Error::other("disk on fire");
        let a = Error::external(io);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Error::external(std::io::Error::other("disk on fire")));
    }
}
