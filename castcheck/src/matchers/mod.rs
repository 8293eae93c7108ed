//! Matchers asserting on what was broadcast during an action.
//!
//! Start from [`have_broadcasted`] (or its alias [`broadcast`]) and refine
//! the matcher with a count and a payload constraint:
//!
//! ```
//! use castcheck::{Server, expect, matchers::*};
//! use serde_json::json;
//!
//! let server = Server::test();
//!
//! expect(&server, || {
//!     server.broadcast("notifications", &json!({"kind": "ping", "seq": 1}))?;
//!     server.broadcast("notifications", &json!({"kind": "ping", "seq": 2}))?;
//!     server.broadcast("audit", &"pinged")
//! })
//! .to(have_broadcasted("notifications")
//!     .at_least(TWICE)
//!     .with(hash_including(json!({"kind": "ping"})))
//!     .and(broadcast("audit").with(json!("pinged"))))?;
//! # Ok::<(), castcheck::Error>(())
//! ```
//!
//! | Builder | Meaning |
//! |---------|---------|
//! | [`exactly`](BroadcastMatcher::exactly), [`once`](BroadcastMatcher::once), [`twice`](BroadcastMatcher::twice), [`thrice`](BroadcastMatcher::thrice) | exact count (default: once) |
//! | [`at_least`](BroadcastMatcher::at_least) / [`at_most`](BroadcastMatcher::at_most) | count bounds |
//! | [`with`](BroadcastMatcher::with) | exact or partial ([`hash_including`]) payload pattern |
//! | [`with_fn`](BroadcastMatcher::with_fn) | custom predicate per payload |
//! | [`and`](BroadcastMatcher::and) | conjunction over the same recording |

mod broadcast;
mod compound;
mod count;
mod match_result;
mod payload;
mod pattern;

pub use broadcast::BroadcastMatcher;
pub use compound::Compound;
pub use count::{CountConstraint, ONCE, THRICE, TWICE};
pub use match_result::MatchResult;
pub use payload::{BoxError, Mismatch, PayloadConstraint, Predicate, ensure_eq};
pub use pattern::{FieldMismatch, Pattern, ValueMatcher, anything, hash_including, satisfying};

use crate::{Channel, Streamable};

/// Expect broadcasts on `channel`; exactly one with any payload unless
/// refined further.
pub fn have_broadcasted(channel: impl Into<Channel>) -> BroadcastMatcher {
    BroadcastMatcher::new(channel)
}

/// Alias of [`have_broadcasted`].
pub fn broadcast(channel: impl Into<Channel>) -> BroadcastMatcher {
    have_broadcasted(channel)
}

/// Expect broadcasts on the channel addressed to `model`.
///
/// The channel name is built by [`Channel::broadcasting_for`].
///
/// ```
/// use castcheck::{Server, Streamable, expect, matchers::have_broadcasted_to};
///
/// struct User(u64);
///
/// impl Streamable for User {
///     fn to_stream_param(&self) -> String {
///         format!("gid://app/User/{}", self.0)
///     }
/// }
///
/// let server = Server::test();
/// let user = User(7);
///
/// expect(&server, || server.broadcast("notifications:gid://app/User/7", &"hi"))
///     .to(have_broadcasted_to(&user, "notifications"))?;
/// # Ok::<(), castcheck::Error>(())
/// ```
pub fn have_broadcasted_to<M: Streamable + ?Sized>(model: &M, prefix: &str) -> BroadcastMatcher {
    BroadcastMatcher::new(Channel::broadcasting_for(prefix, model))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Room(u32);

    impl Streamable for Room {
        fn to_stream_param(&self) -> String {
            format!("room-{}", self.0)
        }
    }

    #[test]
    fn entry_points_target_the_channel() {
        assert_eq!(have_broadcasted("stream").channel(), "stream");
        assert_eq!(broadcast("stream").channel(), "stream");
        assert_eq!(
            have_broadcasted_to(&Room(3), "chat").channel(),
            "chat:room-3"
        );
    }

    #[test]
    fn default_matcher_expects_exactly_once() {
        let matcher = have_broadcasted("stream");
        assert_eq!(matcher.count_constraint(), CountConstraint::Exactly(ONCE));
        assert!(matches!(
            matcher.payload_constraint(),
            PayloadConstraint::None
        ));
    }
}
