//! Structural payload patterns.

use std::{borrow::Cow, collections::BTreeMap, fmt, sync::Arc};

use serde_json::Value;

/// A pluggable comparison for a single payload value.
///
/// Implement this to plug domain-specific comparisons into a [`Pattern`]
/// (tolerances, regexes, "any uuid"). The description is shown in failure
/// messages in place of the expected value.
pub trait ValueMatcher: Send + Sync {
    fn matches(&self, actual: &Value) -> bool;

    fn describe(&self) -> String;
}

/// Shape a broadcast payload is expected to have.
///
/// - [`Pattern::Eq`]: the payload must equal the value exactly; objects may
///   not carry extra keys
/// - [`Pattern::Including`]: the payload must be an object whose listed keys
///   match their patterns; other keys are ignored
/// - [`Pattern::Anything`]: always matches
/// - [`Pattern::Custom`]: defers to a [`ValueMatcher`]
///
/// Patterns nest, so `Including` can hold further patterns per key.
///
/// # Example
///
/// ```
/// use castcheck::matchers::{Pattern, anything, hash_including};
/// use serde_json::json;
///
/// let payload = json!({"id": 42, "name": "David", "message_id": 123});
///
/// assert!(hash_including(json!({"id": 42, "name": "David"})).matches(&payload));
/// assert!(!Pattern::from(json!({"id": 42, "name": "David"})).matches(&payload));
/// assert!(Pattern::including([("id", json!(42).into()), ("name", anything())]).matches(&payload));
/// ```
#[derive(Clone)]
pub enum Pattern {
    Eq(Value),
    Including(BTreeMap<String, Pattern>),
    Anything,
    Custom(Arc<dyn ValueMatcher>),
}

impl Pattern {
    /// Build an [`Including`](Pattern::Including) pattern from key/pattern pairs.
    pub fn including<I, K, P>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Pattern>,
    {
        Pattern::Including(
            fields
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        )
    }

    /// Returns true if `actual` has the expected shape.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Pattern::Eq(expected) => expected == actual,
            Pattern::Including(fields) => actual.as_object().is_some_and(|object| {
                fields
                    .iter()
                    .all(|(key, pattern)| object.get(key).is_some_and(|v| pattern.matches(v)))
            }),
            Pattern::Anything => true,
            Pattern::Custom(matcher) => matcher.matches(actual),
        }
    }

    /// Explains, field by field, why `actual` does not match.
    ///
    /// Empty if and only if [`matches`](Self::matches) returns true.
    pub fn mismatches(&self, actual: &Value) -> Vec<FieldMismatch> {
        let mut out = Vec::new();
        self.collect_mismatches(&FieldPath::root(), Some(actual), &mut out);
        out
    }

    fn collect_mismatches(
        &self,
        path: &FieldPath,
        actual: Option<&Value>,
        out: &mut Vec<FieldMismatch>,
    ) {
        let Some(actual) = actual else {
            out.push(FieldMismatch::missing(path, self.expected_text()));
            return;
        };

        match self {
            Pattern::Eq(Value::Object(expected)) if actual.is_object() => {
                let object = actual.as_object().into_iter().flatten();
                for (key, value) in expected {
                    let child = Pattern::Eq(value.clone());
                    child.collect_mismatches(&path.child(key), actual.get(key), out);
                }
                for (key, value) in object.filter(|(key, _)| !expected.contains_key(*key)) {
                    out.push(FieldMismatch::unexpected(&path.child(key), value));
                }
            }
            Pattern::Eq(expected) => {
                if expected != actual {
                    out.push(FieldMismatch::differs(path, render_value(expected), actual));
                }
            }
            Pattern::Including(fields) => match actual.as_object() {
                Some(object) => {
                    for (key, pattern) in fields {
                        pattern.collect_mismatches(&path.child(key), object.get(key), out);
                    }
                }
                None => {
                    out.push(FieldMismatch::differs(path, self.to_string().into(), actual));
                }
            },
            Pattern::Anything => {}
            Pattern::Custom(matcher) => {
                if !matcher.matches(actual) {
                    out.push(FieldMismatch::differs(path, matcher.describe().into(), actual));
                }
            }
        }
    }

    fn expected_text(&self) -> Cow<'_, str> {
        match self {
            Pattern::Eq(value) => render_value(value),
            other => other.to_string().into(),
        }
    }
}

impl From<Value> for Pattern {
    fn from(value: Value) -> Self {
        Pattern::Eq(value)
    }
}

impl<M: ValueMatcher + 'static> From<Arc<M>> for Pattern {
    fn from(matcher: Arc<M>) -> Self {
        Pattern::Custom(matcher)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Eq(value) => write!(f, "{value}"),
            Pattern::Including(fields) => {
                write!(f, "a hash including {{")?;
                for (i, (key, pattern)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {pattern}", Value::String(key.clone()))?;
                }
                write!(f, "}}")
            }
            Pattern::Anything => write!(f, "anything"),
            Pattern::Custom(matcher) => write!(f, "{}", matcher.describe()),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Eq(value) => f.debug_tuple("Eq").field(value).finish(),
            Pattern::Including(fields) => f.debug_tuple("Including").field(fields).finish(),
            Pattern::Anything => write!(f, "Anything"),
            Pattern::Custom(matcher) => f
                .debug_tuple("Custom")
                .field(&matcher.describe())
                .finish(),
        }
    }
}

/// Match an object containing at least the fields of `fields`.
///
/// Each field value is compared by equality. A non-object argument has no
/// fields to look for and degrades to an exact [`Pattern::Eq`].
pub fn hash_including(fields: Value) -> Pattern {
    match fields {
        Value::Object(map) => Pattern::including(map),
        other => Pattern::Eq(other),
    }
}

/// Match any value, as long as it is present.
pub fn anything() -> Pattern {
    Pattern::Anything
}

/// Match values accepted by `predicate`, described as `description` in failures.
pub fn satisfying<F>(description: impl Into<String>, predicate: F) -> Pattern
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Pattern::Custom(Arc::new(FnMatcher {
        description: description.into(),
        predicate,
    }))
}

struct FnMatcher<F> {
    description: String,
    predicate: F,
}

impl<F> ValueMatcher for FnMatcher<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn matches(&self, actual: &Value) -> bool {
        (self.predicate)(actual)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// Render a value for a single-line diff: strings bare, everything else as JSON.
pub(crate) fn render_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldPath(String);

impl FieldPath {
    fn root() -> Self {
        FieldPath(String::new())
    }

    fn child(&self, key: &str) -> Self {
        if self.0.is_empty() {
            FieldPath(key.to_string())
        } else {
            FieldPath(format!("{}.{key}", self.0))
        }
    }

    fn display(&self) -> String {
        if self.0.is_empty() {
            "payload".to_string()
        } else {
            self.0.clone()
        }
    }
}

/// One reason a payload did not match a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    path: String,
    kind: MismatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MismatchKind {
    Differs { expected: String, actual: String },
    Missing { expected: String },
    Unexpected { actual: String },
}

impl FieldMismatch {
    fn differs(path: &FieldPath, expected: Cow<'_, str>, actual: &Value) -> Self {
        Self {
            path: path.display(),
            kind: MismatchKind::Differs {
                expected: expected.into_owned(),
                actual: render_value(actual).into_owned(),
            },
        }
    }

    fn missing(path: &FieldPath, expected: Cow<'_, str>) -> Self {
        Self {
            path: path.display(),
            kind: MismatchKind::Missing {
                expected: expected.into_owned(),
            },
        }
    }

    fn unexpected(path: &FieldPath, actual: &Value) -> Self {
        Self {
            path: path.display(),
            kind: MismatchKind::Unexpected {
                actual: render_value(actual).into_owned(),
            },
        }
    }

    /// Dotted path of the offending field, or `payload` for the whole value.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// What the pattern expected, if the field was expected at all.
    pub fn expected(&self) -> Option<&str> {
        match &self.kind {
            MismatchKind::Differs { expected, .. } | MismatchKind::Missing { expected } => {
                Some(expected)
            }
            MismatchKind::Unexpected { .. } => None,
        }
    }

    /// What the payload held, or `None` if the field was missing.
    pub fn actual(&self) -> Option<&str> {
        match &self.kind {
            MismatchKind::Differs { actual, .. } | MismatchKind::Unexpected { actual } => {
                Some(actual)
            }
            MismatchKind::Missing { .. } => None,
        }
    }
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MismatchKind::Differs { expected, actual } => {
                write!(f, "{}: expected {expected}, got {actual}", self.path)
            }
            MismatchKind::Missing { expected } => {
                write!(f, "{}: expected {expected}, but it is missing", self.path)
            }
            MismatchKind::Unexpected { actual } => {
                write!(f, "{}: unexpected value {actual}", self.path)
            }
        }
    }
}
