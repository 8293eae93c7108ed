use serde_json::Value;

use crate::{
    Channel, Config, RecordedMessage, Result,
    matchers::{
        BoxError, Compound, CountConstraint, FieldMismatch, MatchResult, ONCE, PayloadConstraint,
        Pattern, Predicate, THRICE, TWICE,
    },
};

/// Asserts on the broadcasts made to one channel.
///
/// Build one with [`have_broadcasted`](super::have_broadcasted) or its alias
/// [`broadcast`](super::broadcast), configure it fluently, then hand it to
/// [`expect`](crate::expect). Without further configuration it expects
/// exactly one broadcast with any payload.
///
/// Evaluation consumes the matcher, so each one is evaluated exactly once.
///
/// # Example
///
/// ```
/// use castcheck::{Server, expect, have_broadcasted, matchers::hash_including};
/// use serde_json::json;
///
/// let server = Server::test();
///
/// expect(&server, || {
///     server.broadcast("stream", &json!({"id": 42, "name": "David", "message_id": 123}))?;
///     server.broadcast("stream", &json!({"id": 43, "name": "David", "message_id": 124}))
/// })
/// .to(have_broadcasted("stream")
///     .twice()
///     .with(hash_including(json!({"name": "David"}))))?;
/// # Ok::<(), castcheck::Error>(())
/// ```
#[derive(Debug)]
pub struct BroadcastMatcher {
    channel: Channel,
    count: CountConstraint,
    payload: PayloadConstraint,
}

impl BroadcastMatcher {
    pub fn new(channel: impl Into<Channel>) -> Self {
        Self {
            channel: channel.into(),
            count: CountConstraint::default(),
            payload: PayloadConstraint::None,
        }
    }

    // ==================== Count ====================

    /// Require exactly `n` broadcasts.
    pub fn exactly(mut self, n: usize) -> Self {
        self.count = CountConstraint::Exactly(n);
        self
    }

    /// Require `n` or more broadcasts.
    pub fn at_least(mut self, n: usize) -> Self {
        self.count = CountConstraint::AtLeast(n);
        self
    }

    /// Require `n` or fewer broadcasts.
    pub fn at_most(mut self, n: usize) -> Self {
        self.count = CountConstraint::AtMost(n);
        self
    }

    pub fn once(self) -> Self {
        self.exactly(ONCE)
    }

    pub fn twice(self) -> Self {
        self.exactly(TWICE)
    }

    pub fn thrice(self) -> Self {
        self.exactly(THRICE)
    }

    // ==================== Payload ====================

    /// Require payloads to match `pattern`.
    ///
    /// A plain [`Value`] means exact equality; use
    /// [`hash_including`](super::hash_including) for a partial match.
    /// Replaces any predicate set with [`with_fn`](Self::with_fn).
    ///
    /// The count constraint is first checked against every broadcast on the
    /// channel, matching or not, and only then against the matching ones.
    /// `at_most(1)` therefore passes when the single broadcast does not
    /// match, while `exactly(0)` fails as soon as anything was broadcast.
    pub fn with(mut self, pattern: impl Into<Pattern>) -> Self {
        self.payload = PayloadConstraint::Structural(pattern.into());
        self
    }

    /// Run `check` against every payload on the channel, in order.
    ///
    /// The first error `check` returns becomes the error of the whole
    /// expectation, message untouched. Replaces any pattern set with
    /// [`with`](Self::with).
    ///
    /// ```
    /// use castcheck::{Server, expect, have_broadcasted, matchers::ensure_eq};
    ///
    /// let server = Server::test();
    /// let err = expect(&server, || server.broadcast("stream", "asdf"))
    ///     .to(have_broadcasted("stream").with_fn(|data| ensure_eq(data, "zxcv")))
    ///     .unwrap_err();
    ///
    /// assert!(err.to_string().contains("expected: zxcv"));
    /// assert!(err.to_string().contains("got: asdf"));
    /// ```
    pub fn with_fn<F, E>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.payload = PayloadConstraint::Custom(Predicate::new(check));
        self
    }

    /// Combine with another matcher evaluated against the same recording.
    pub fn and(self, other: BroadcastMatcher) -> Compound {
        Compound::from(self).and(other)
    }

    // ==================== Accessors ====================

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn count_constraint(&self) -> CountConstraint {
        self.count
    }

    pub fn payload_constraint(&self) -> &PayloadConstraint {
        &self.payload
    }

    // ==================== Evaluation ====================

    /// Evaluate against `messages` with the default [`Config`].
    pub fn evaluate(self, messages: &[RecordedMessage]) -> Result<MatchResult> {
        self.evaluate_with(messages, &Config::default())
    }

    /// Evaluate against `messages`, typically the output of a finished
    /// [`Recording`](crate::Recording).
    ///
    /// Only messages on this matcher's channel are considered. The count
    /// constraint is checked first; payloads are only inspected when it
    /// passes.
    ///
    /// # Errors
    ///
    /// An unsatisfied constraint is *not* an error; it yields a
    /// [`MatchResult`] with `success() == false`. Errors are reserved for
    /// failures raised by a custom predicate, which are returned unchanged.
    pub fn evaluate_with(
        self,
        messages: &[RecordedMessage],
        config: &Config,
    ) -> Result<MatchResult> {
        let on_channel: Vec<&RecordedMessage> = messages
            .iter()
            .filter(|m| m.channel_eq(&self.channel))
            .collect();

        let (count_ok, phrase) = self.count.check(on_channel.len());
        if !count_ok {
            let description = self.base_description(&phrase, on_channel.len());
            return Ok(self.verdict(false, on_channel.len(), description));
        }

        let payload = self.payload.check(&on_channel)?;
        let success = self.count.is_satisfied_by(payload.matching);
        let mut description = self.base_description(&phrase, payload.matching);
        if !success {
            self.append_unmatched(&mut description, &payload.unmatched, config);
        }
        Ok(self.verdict(success, payload.matching, description))
    }

    fn base_description(&self, phrase: &str, actual: usize) -> String {
        let pattern = self
            .payload
            .description()
            .map(|payload| format!(" with {payload}"))
            .unwrap_or_default();
        format!(
            "{phrase} messages to {}{pattern}, but broadcast {actual}",
            self.channel
        )
    }

    fn append_unmatched(
        &self,
        description: &mut String,
        unmatched: &[(&RecordedMessage, Vec<FieldMismatch>)],
        config: &Config,
    ) {
        if unmatched.is_empty() {
            return;
        }
        description.push_str(&format!("\nBroadcasted messages to {}:", self.channel));

        let limit = config.max_reported_messages();
        for (message, mismatches) in unmatched.iter().take(limit) {
            let rendered = if config.pretty_payloads() {
                serde_json::to_string_pretty(message.payload())
            } else {
                serde_json::to_string(message.payload())
            }
            .unwrap_or_else(|_| message.payload().to_string());

            for line in rendered.lines() {
                description.push_str("\n   ");
                description.push_str(line);
            }
            for mismatch in mismatches {
                description.push_str(&format!("\n     {mismatch}"));
            }
        }
        if unmatched.len() > limit {
            let rest = unmatched.len() - limit;
            description.push_str(&format!("\n   ... and {rest} more"));
        }
    }

    fn verdict(&self, success: bool, actual: usize, description: String) -> MatchResult {
        tracing::debug!(
            channel = %self.channel,
            constraint = %self.count,
            actual,
            success,
            "broadcast matcher evaluated"
        );
        MatchResult::new(success, actual, description)
    }
}
