use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::{
    Error, RecordedMessage, Result,
    matchers::{FieldMismatch, Pattern, pattern::render_value},
};

/// Error type custom payload predicates may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type PredicateFn = Arc<dyn Fn(&Value) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Caller-supplied check run against each broadcast payload.
///
/// The first error it returns is surfaced unchanged as
/// [`Error::Predicate`](crate::Error::Predicate).
#[derive(Clone)]
pub struct Predicate(PredicateFn);

impl Predicate {
    pub fn new<F, E>(check: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self(Arc::new(move |payload| check(payload).map_err(Into::into)))
    }

    fn call(&self, payload: &Value) -> std::result::Result<(), BoxError> {
        (self.0)(payload)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

/// What the payloads of the broadcasts on a channel must look like.
#[derive(Debug, Clone, Default)]
pub enum PayloadConstraint {
    #[default]
    None,
    Structural(Pattern),
    Custom(Predicate),
}

/// Outcome of checking a channel's broadcasts against a [`PayloadConstraint`].
#[derive(Debug)]
pub(crate) struct PayloadCheck<'a> {
    pub matching: usize,
    pub unmatched: Vec<(&'a RecordedMessage, Vec<FieldMismatch>)>,
}

impl PayloadConstraint {
    /// Short description for failure messages, if the constraint has one.
    pub(crate) fn description(&self) -> Option<String> {
        match self {
            PayloadConstraint::Structural(pattern) => Some(pattern.to_string()),
            PayloadConstraint::None | PayloadConstraint::Custom(_) => None,
        }
    }

    /// Check `messages` in order.
    ///
    /// Structural patterns partition the messages into matching and
    /// unmatched. A custom predicate runs on every message and its first
    /// error aborts the check.
    pub(crate) fn check<'a>(&self, messages: &[&'a RecordedMessage]) -> Result<PayloadCheck<'a>> {
        match self {
            PayloadConstraint::None => Ok(PayloadCheck {
                matching: messages.len(),
                unmatched: Vec::new(),
            }),
            PayloadConstraint::Structural(pattern) => {
                let mut matching = 0;
                let mut unmatched = Vec::new();
                for &message in messages {
                    let mismatches = pattern.mismatches(message.payload());
                    if mismatches.is_empty() {
                        matching += 1;
                    } else {
                        unmatched.push((message, mismatches));
                    }
                }
                Ok(PayloadCheck {
                    matching,
                    unmatched,
                })
            }
            PayloadConstraint::Custom(predicate) => {
                for message in messages {
                    predicate.call(message.payload()).map_err(Error::predicate)?;
                }
                Ok(PayloadCheck {
                    matching: messages.len(),
                    unmatched: Vec::new(),
                })
            }
        }
    }
}

/// Two payload values that should have been equal.
///
/// Returned by [`ensure_eq`]; its message names both values so it can be
/// surfaced as-is from a custom predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    expected: Value,
    actual: Value,
}

impl Mismatch {
    pub fn expected(&self) -> &Value {
        &self.expected
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected: {}\n     got: {}",
            render_value(&self.expected),
            render_value(&self.actual)
        )
    }
}

impl std::error::Error for Mismatch {}

/// Check that a payload equals `expected`, for use inside custom predicates.
///
/// ```
/// use castcheck::matchers::ensure_eq;
/// use serde_json::json;
///
/// assert!(ensure_eq(&json!("asdf"), "asdf").is_ok());
///
/// let err = ensure_eq(&json!("asdf"), "zxcv").unwrap_err();
/// assert_eq!(err.to_string(), "expected: zxcv\n     got: asdf");
/// ```
pub fn ensure_eq(actual: &Value, expected: impl Into<Value>) -> std::result::Result<(), Mismatch> {
    let expected = expected.into();
    if *actual == expected {
        Ok(())
    } else {
        Err(Mismatch {
            expected,
            actual: actual.clone(),
        })
    }
}
