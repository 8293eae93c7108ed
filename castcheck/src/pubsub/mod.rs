//! Pub/sub backends a [`Server`](crate::Server) can broadcast through.
//!
//! Two in-process implementations ship with the crate:
//!
//! - [`TestAdapter`] - records every broadcast so the matchers can assert on
//!   it, and delivers synchronously to subscribers
//! - [`InlineAdapter`] - delivers synchronously to subscribers and records
//!   nothing; stands in for a live backend
//!
//! Custom backends implement [`PubSub`]. Only a backend that hands out a
//! [`TestAdapter`] through [`PubSub::as_test_adapter`] can be recorded.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use castcheck::{Channel, pubsub::{PubSub, TestAdapter}};
//! use serde_json::{Value, json};
//!
//! let adapter = TestAdapter::new();
//! let channel = Channel::new("chat");
//! adapter.subscribe(&channel, Arc::new(|payload: &Value| println!("got {payload}")));
//! adapter.broadcast(&channel, json!({"body": "hi"}))?;
//!
//! assert_eq!(adapter.broadcasts("chat"), vec![json!({"body": "hi"})]);
//! # Ok::<(), castcheck::Error>(())
//! ```

mod inline;
mod subscriber_map;
mod test_adapter;

use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::{Channel, Result};

pub use inline::InlineAdapter;
pub(crate) use subscriber_map::SubscriberMap;
pub use test_adapter::TestAdapter;

/// Callback invoked with each payload broadcast to a subscribed channel.
pub type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Identifies one subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SubscriptionId {
    fn from(value: u64) -> Self {
        SubscriptionId(value)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contract between a [`Server`](crate::Server) and its transport.
///
/// Implementations must deliver synchronously or buffer internally; the
/// matchers assume every broadcast made by an action is visible once the
/// action has returned.
///
/// Callbacks may broadcast again. Implementations must not hold a lock
/// while invoking them.
pub trait PubSub: Send + Sync {
    /// Publish `payload` to every subscriber of `channel`.
    fn broadcast(&self, channel: &Channel, payload: Value) -> Result;

    /// Register `callback` for broadcasts on `channel`.
    fn subscribe(&self, channel: &Channel, callback: Callback) -> SubscriptionId;

    /// Remove a subscription. Returns false if it was not registered.
    fn unsubscribe(&self, channel: &Channel, id: SubscriptionId) -> bool;

    /// Returns the recording test adapter behind this backend, if any.
    fn as_test_adapter(&self) -> Option<&TestAdapter> {
        None
    }
}

impl<P: PubSub + ?Sized> PubSub for Arc<P> {
    fn broadcast(&self, channel: &Channel, payload: Value) -> Result {
        (**self).broadcast(channel, payload)
    }

    fn subscribe(&self, channel: &Channel, callback: Callback) -> SubscriptionId {
        (**self).subscribe(channel, callback)
    }

    fn unsubscribe(&self, channel: &Channel, id: SubscriptionId) -> bool {
        (**self).unsubscribe(channel, id)
    }

    fn as_test_adapter(&self) -> Option<&TestAdapter> {
        (**self).as_test_adapter()
    }
}

/// Run every callback with `payload`.
fn deliver(callbacks: Vec<Callback>, payload: &Value) {
    for callback in callbacks {
        callback(payload);
    }
}
