use serde_json::Value;

use crate::Channel;

/// A broadcast captured while a [`Recording`](crate::Recording) was armed.
///
/// # Fields
///
/// - `sequence`: publish ordinal on the adapter, strictly increasing
/// - `channel`: the channel the payload was published to
/// - `payload`: the JSON-encoded payload, exactly as subscribers saw it
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RecordedMessage {
    sequence: u64,
    channel: Channel,
    payload: Value,
}

impl RecordedMessage {
    pub(crate) fn new(sequence: u64, channel: Channel, payload: Value) -> Self {
        Self {
            sequence,
            channel,
            payload,
        }
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    #[inline]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns true if this message was published to `channel`.
    #[inline]
    pub(crate) fn channel_eq(&self, channel: &Channel) -> bool {
        self.channel == *channel
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accessors_return_recorded_fields() {
        let message = RecordedMessage::new(7, Channel::new("stream"), json!({"id": 1}));
        assert_eq!(message.sequence(), 7);
        assert_eq!(message.channel().as_str(), "stream");
        assert_eq!(message.payload(), &json!({"id": 1}));
    }

    #[test]
    fn channel_eq_matches_exact_name_only() {
        let message = RecordedMessage::new(0, Channel::new("stream"), json!("hello"));
        assert!(message.channel_eq(&Channel::new("stream")));
        assert!(!message.channel_eq(&Channel::new("stream_a")));
    }

    #[test]
    fn serializes_as_plain_json() {
        let message = RecordedMessage::new(3, Channel::new("stream"), json!("hello"));
        let encoded = serde_json::to_value(&message).unwrap();
        assert_eq!(
            encoded,
            json!({"sequence": 3, "channel": "stream", "payload": "hello"})
        );
    }
}
