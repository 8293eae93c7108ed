use crate::matchers::BroadcastMatcher;

/// Several [`BroadcastMatcher`]s evaluated against one recording.
///
/// Built with [`BroadcastMatcher::and`]. Every matcher sees the same
/// recorded messages, so an action is only run once no matter how many
/// channels are asserted on. The compound passes only if every matcher
/// passes.
///
/// Compounds can only be used with [`Expect::to`](crate::Expect::to);
/// negating one is rejected at compile time:
///
/// ```compile_fail
/// use castcheck::{Server, expect, have_broadcasted};
///
/// let server = Server::test();
/// expect(&server, || Ok(()))
///     .not_to(have_broadcasted("a").and(have_broadcasted("b")));
/// ```
#[derive(Debug)]
pub struct Compound {
    matchers: Vec<BroadcastMatcher>,
}

impl Compound {
    /// Add another matcher to the conjunction.
    pub fn and(mut self, matcher: BroadcastMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub(crate) fn into_matchers(self) -> Vec<BroadcastMatcher> {
        self.matchers
    }
}

impl From<BroadcastMatcher> for Compound {
    fn from(matcher: BroadcastMatcher) -> Self {
        Self {
            matchers: vec![matcher],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_keeps_matchers_in_order() {
        let compound = BroadcastMatcher::new("stream")
            .and(BroadcastMatcher::new("stream_a"))
            .and(BroadcastMatcher::new("stream_b"));

        assert_eq!(compound.len(), 3);
        let channels: Vec<_> = compound
            .into_matchers()
            .into_iter()
            .map(|m| m.channel().to_string())
            .collect();
        assert_eq!(channels, ["stream", "stream_a", "stream_b"]);
    }

    #[test]
    fn single_matcher_converts() {
        let compound = Compound::from(BroadcastMatcher::new("stream"));
        assert!(!compound.is_empty());
        assert_eq!(compound.len(), 1);
    }
}
