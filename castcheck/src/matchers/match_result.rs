/// Verdict of one [`BroadcastMatcher`](super::BroadcastMatcher) evaluation.
///
/// `description` is phrased to follow "expected to broadcast" or
/// "expected not to broadcast", e.g.
/// `exactly 1 messages to stream, but broadcast 0`; the failure message
/// helpers add the right prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    success: bool,
    actual_count: usize,
    description: String,
}

impl MatchResult {
    pub(crate) fn new(success: bool, actual_count: usize, description: String) -> Self {
        Self {
            success,
            actual_count,
            description,
        }
    }

    /// Returns true if every constraint was satisfied.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Number of broadcasts counted against the count constraint.
    ///
    /// This is the number on the channel when the count check failed, and
    /// the number whose payload matched otherwise.
    pub fn actual_count(&self) -> usize {
        self.actual_count
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn failure_message(&self) -> String {
        format!("expected to broadcast {}", self.description)
    }

    pub fn negated_failure_message(&self) -> String {
        format!("expected not to broadcast {}", self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_share_the_description() {
        let description = "exactly 1 messages to stream, but broadcast 0".to_string();
        let result = MatchResult::new(false, 0, description);
        assert_eq!(
            result.failure_message(),
            "expected to broadcast exactly 1 messages to stream, but broadcast 0"
        );
        assert_eq!(
            result.negated_failure_message(),
            "expected not to broadcast exactly 1 messages to stream, but broadcast 0"
        );
    }
}
