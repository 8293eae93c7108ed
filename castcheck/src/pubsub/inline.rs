use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;

use crate::{
    Channel, Result,
    pubsub::{Callback, PubSub, SubscriberMap, SubscriptionId, deliver},
};

/// In-process backend that delivers broadcasts straight to subscribers.
///
/// Nothing is recorded, so the broadcast matchers refuse to run against a
/// server using it and report [`Error::TestAdapterRequired`](crate::Error::TestAdapterRequired).
#[derive(Clone, Default)]
pub struct InlineAdapter {
    subscribers: Arc<Mutex<SubscriberMap>>,
}

impl fmt::Debug for InlineAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineAdapter")
            .field("channels", &self.lock().channel_count())
            .finish()
    }
}

impl InlineAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SubscriberMap> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PubSub for InlineAdapter {
    fn broadcast(&self, channel: &Channel, payload: Value) -> Result {
        let callbacks = self.lock().callbacks(channel);
        tracing::trace!(channel = %channel, subscribers = callbacks.len(), "broadcast");
        deliver(callbacks, &payload);
        Ok(())
    }

    fn subscribe(&self, channel: &Channel, callback: Callback) -> SubscriptionId {
        self.lock().add(channel, callback)
    }

    fn unsubscribe(&self, channel: &Channel, id: SubscriptionId) -> bool {
        self.lock().remove(channel, id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn delivers_to_subscribers_of_the_channel_only() {
        let adapter = InlineAdapter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        adapter.subscribe(
            &Channel::new("stream"),
            Arc::new(move |payload: &Value| sink.lock().unwrap().push(payload.clone())),
        );

        adapter.broadcast(&"stream".into(), json!("hello")).unwrap();
        adapter.broadcast(&"other".into(), json!("ignored")).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![json!("hello")]);
    }

    #[test]
    fn is_not_a_test_adapter() {
        assert!(InlineAdapter::new().as_test_adapter().is_none());
    }
}
