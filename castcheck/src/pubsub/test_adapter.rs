use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;

use crate::{
    Channel, Error, RecordedMessage, Result,
    pubsub::{Callback, PubSub, SubscriberMap, SubscriptionId, deliver},
    recorder::RecordingScope,
};

#[derive(Default)]
struct State {
    subscribers: SubscriberMap,
    history: HashMap<Channel, Vec<Value>>,
    next_sequence: u64,
    last_scope_id: u64,
    scope: Option<RecordingScope>,
}

/// In-memory pub/sub backend for tests.
///
/// Every broadcast is appended to a per-channel history and delivered
/// synchronously to subscribers. While a [`Recording`](crate::Recording) is
/// armed, broadcasts are also captured into its scope.
///
/// Clones share the same state, so the adapter can be handed to the
/// [`Server`](crate::Server) under test and kept by the test for inspection.
///
/// # Warning
///
/// **Do not use in production.** The history grows without bound until
/// [`clear`](Self::clear) is called.
#[derive(Clone, Default)]
pub struct TestAdapter {
    state: Arc<Mutex<State>>,
}

impl fmt::Debug for TestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TestAdapter")
            .field("channels", &state.history.len())
            .field("next_sequence", &state.next_sequence)
            .field("recording", &state.scope.is_some())
            .finish_non_exhaustive()
    }
}

impl TestAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // No caller code runs under the lock, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== History ====================

    /// Returns every payload broadcast to `channel` since the last clear.
    pub fn broadcasts(&self, channel: impl Into<Channel>) -> Vec<Value> {
        let channel = channel.into();
        self.lock()
            .history
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget the history of a single channel.
    ///
    /// Does not affect an armed recording.
    pub fn clear_messages(&self, channel: impl Into<Channel>) {
        let channel = channel.into();
        let mut state = self.lock();
        if state.scope.is_some() {
            tracing::warn!(
                channel = %channel,
                "clearing channel history while a recording is armed"
            );
        }
        state.history.remove(&channel);
    }

    /// Forget the history of every channel.
    ///
    /// Does not affect an armed recording.
    pub fn clear(&self) {
        let mut state = self.lock();
        if state.scope.is_some() {
            tracing::warn!("clearing broadcast history while a recording is armed");
        }
        state.history.clear();
    }

    // ==================== Recording ====================

    /// Returns true while a recording is armed.
    pub fn is_recording(&self) -> bool {
        self.lock().scope.is_some()
    }

    pub(crate) fn arm(&self) -> Result<u64> {
        let mut state = self.lock();
        if state.scope.is_some() {
            return Err(Error::NestedRecording);
        }
        state.last_scope_id += 1;
        let id = state.last_scope_id;
        state.scope = Some(RecordingScope::new(id));
        Ok(id)
    }

    /// Disarm the scope `id` and hand back what it captured.
    ///
    /// A stale id (scope already disarmed) yields nothing.
    pub(crate) fn disarm(&self, id: u64) -> Vec<RecordedMessage> {
        let mut state = self.lock();
        match state.scope.take() {
            Some(scope) if scope.id() == id => scope.into_messages(),
            other => {
                state.scope = other;
                Vec::new()
            }
        }
    }
}

impl PubSub for TestAdapter {
    fn broadcast(&self, channel: &Channel, payload: Value) -> Result {
        let callbacks = {
            let mut state = self.lock();
            let sequence = state.next_sequence;
            state.next_sequence += 1;

            tracing::trace!(channel = %channel, sequence, "broadcast");

            state
                .history
                .entry(channel.clone())
                .or_default()
                .push(payload.clone());
            if let Some(scope) = state.scope.as_mut() {
                scope.record(sequence, channel.clone(), payload.clone());
            }
            state.subscribers.callbacks(channel)
        };
        deliver(callbacks, &payload);
        Ok(())
    }

    fn subscribe(&self, channel: &Channel, callback: Callback) -> SubscriptionId {
        self.lock().subscribers.add(channel, callback)
    }

    fn unsubscribe(&self, channel: &Channel, id: SubscriptionId) -> bool {
        self.lock().subscribers.remove(channel, id)
    }

    fn as_test_adapter(&self) -> Option<&TestAdapter> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    #[test]
    fn history_is_kept_per_channel() {
        let adapter = TestAdapter::new();
        adapter.broadcast(&"a".into(), json!(1)).unwrap();
        adapter.broadcast(&"b".into(), json!(2)).unwrap();
        adapter.broadcast(&"a".into(), json!(3)).unwrap();

        assert_eq!(adapter.broadcasts("a"), vec![json!(1), json!(3)]);
        assert_eq!(adapter.broadcasts("b"), vec![json!(2)]);
        assert!(adapter.broadcasts("c").is_empty());
    }

    #[test]
    fn clear_messages_only_touches_one_channel() {
        let adapter = TestAdapter::new();
        adapter.broadcast(&"a".into(), json!(1)).unwrap();
        adapter.broadcast(&"b".into(), json!(2)).unwrap();

        adapter.clear_messages("a");
        assert!(adapter.broadcasts("a").is_empty());
        assert_eq!(adapter.broadcasts("b"), vec![json!(2)]);

        adapter.clear();
        assert!(adapter.broadcasts("b").is_empty());
    }

    #[test]
    fn subscribers_receive_payloads_synchronously() {
        let adapter = TestAdapter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let channel = Channel::new("stream");
        let id = adapter.subscribe(
            &channel,
            Arc::new(move |_: &Value| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        adapter.broadcast(&channel, json!("one")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(adapter.unsubscribe(&channel, id));
        adapter.broadcast(&channel, json!("two")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arm_twice_is_rejected() {
        let adapter = TestAdapter::new();
        let id = adapter.arm().unwrap();
        assert_eq!(adapter.arm(), Err(Error::NestedRecording));
        adapter.disarm(id);
        assert!(adapter.arm().is_ok());
    }

    #[test]
    fn only_armed_window_is_captured() {
        let adapter = TestAdapter::new();
        adapter.broadcast(&"stream".into(), json!("before")).unwrap();

        let id = adapter.arm().unwrap();
        adapter.broadcast(&"stream".into(), json!("inside")).unwrap();
        let captured = adapter.disarm(id);

        adapter.broadcast(&"stream".into(), json!("after")).unwrap();

        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].payload(), &json!("inside"));
        assert_eq!(captured[0].sequence(), 1);
        assert_eq!(adapter.broadcasts("stream").len(), 3);
    }

    #[test]
    fn stale_disarm_leaves_current_scope_alone() {
        let adapter = TestAdapter::new();
        let first = adapter.arm().unwrap();
        adapter.disarm(first);

        let second = adapter.arm().unwrap();
        assert!(adapter.disarm(first).is_empty());
        assert!(adapter.is_recording());
        adapter.disarm(second);
        assert!(!adapter.is_recording());
    }

    #[test]
    fn reentrant_broadcast_from_callback_is_recorded_in_order() {
        let adapter = TestAdapter::new();
        let relay = adapter.clone();
        adapter.subscribe(
            &Channel::new("inbox"),
            Arc::new(move |payload: &Value| {
                relay
                    .broadcast(&Channel::new("outbox"), json!({"echo": payload}))
                    .unwrap();
            }),
        );

        let id = adapter.arm().unwrap();
        adapter.broadcast(&"inbox".into(), json!("ping")).unwrap();
        let captured = adapter.disarm(id);

        let channels: Vec<_> = captured.iter().map(|m| m.channel().as_str()).collect();
        assert_eq!(channels, ["inbox", "outbox"]);
        assert_eq!(captured[1].payload(), &json!({"echo": "ping"}));
    }
}
