use std::collections::HashMap;

use crate::{
    Channel,
    pubsub::{Callback, SubscriptionId},
};

/// Per-channel subscriber lists shared by the in-process adapters.
///
/// Not synchronized on its own; adapters keep it behind their lock and
/// clone the callbacks out before invoking them.
#[derive(Default)]
pub(crate) struct SubscriberMap {
    subscribers: HashMap<Channel, Vec<(SubscriptionId, Callback)>>,
    last_id: u64,
}

impl SubscriberMap {
    pub fn add(&mut self, channel: &Channel, callback: Callback) -> SubscriptionId {
        self.last_id += 1;
        let id = SubscriptionId::from(self.last_id);
        self.subscribers
            .entry(channel.clone())
            .or_default()
            .push((id, callback));
        id
    }

    pub fn remove(&mut self, channel: &Channel, id: SubscriptionId) -> bool {
        let Some(list) = self.subscribers.get_mut(channel) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.subscribers.remove(channel);
        }
        removed
    }

    /// Snapshot of the callbacks registered for `channel`, in subscription order.
    pub fn callbacks(&self, channel: &Channel) -> Vec<Callback> {
        self.subscribers
            .get(channel)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }

    pub fn channel_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn noop() -> Callback {
        Arc::new(|_: &serde_json::Value| {})
    }

    #[test]
    fn ids_are_unique_across_channels() {
        let mut map = SubscriberMap::default();
        let a = map.add(&Channel::new("a"), noop());
        let b = map.add(&Channel::new("b"), noop());
        assert_ne!(a, b);
    }

    #[test]
    fn remove_drops_empty_channels() {
        let mut map = SubscriberMap::default();
        let channel = Channel::new("stream");
        let id = map.add(&channel, noop());
        assert_eq!(map.channel_count(), 1);

        assert!(map.remove(&channel, id));
        assert_eq!(map.channel_count(), 0);
        assert!(!map.remove(&channel, id));
    }

    #[test]
    fn callbacks_preserve_subscription_order() {
        let mut map = SubscriberMap::default();
        let channel = Channel::new("stream");
        let first = noop();
        let second = noop();
        map.add(&channel, first.clone());
        map.add(&channel, second.clone());

        let callbacks = map.callbacks(&channel);
        assert_eq!(callbacks.len(), 2);
        assert!(Arc::ptr_eq(&callbacks[0], &first));
        assert!(Arc::ptr_eq(&callbacks[1], &second));
        assert!(map.callbacks(&Channel::new("other")).is_empty());
    }
}
