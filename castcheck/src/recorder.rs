use std::fmt;

use serde_json::Value;

use crate::{
    Channel, Error, RecordedMessage, Result,
    pubsub::{PubSub, TestAdapter},
};

/// The capture slot a [`TestAdapter`] fills while a recording is armed.
pub(crate) struct RecordingScope {
    id: u64,
    messages: Vec<RecordedMessage>,
}

impl RecordingScope {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn record(&mut self, sequence: u64, channel: Channel, payload: Value) {
        tracing::trace!(recording = self.id, channel = %channel, sequence, "recorded broadcast");
        self.messages
            .push(RecordedMessage::new(sequence, channel, payload));
    }

    pub fn into_messages(self) -> Vec<RecordedMessage> {
        self.messages
    }
}

/// Captures broadcasts made through a test-mode backend.
///
/// A recorder can only be attached to a backend that exposes a
/// [`TestAdapter`]; anything else is a setup mistake and is reported as
/// [`Error::TestAdapterRequired`] instead of silently recording nothing.
///
/// # Example
///
/// ```
/// use castcheck::{Recorder, Server};
///
/// let server = Server::test();
/// let recorder = Recorder::new(server.pubsub())?;
///
/// server.broadcast("stream", "before")?;
/// let recording = recorder.begin_recording()?;
/// server.broadcast("stream", "during")?;
/// let messages = recording.finish();
///
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].payload(), "during");
/// # Ok::<(), castcheck::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Recorder {
    adapter: TestAdapter,
}

impl Recorder {
    /// Attach a recorder to `pubsub`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TestAdapterRequired`] if `pubsub` is not backed by a
    /// [`TestAdapter`].
    pub fn new(pubsub: &dyn PubSub) -> Result<Self> {
        let adapter = pubsub
            .as_test_adapter()
            .ok_or(Error::TestAdapterRequired)?
            .clone();
        Ok(Self { adapter })
    }

    /// Arm the recording slot.
    ///
    /// Every broadcast made through the adapter from now until the returned
    /// [`Recording`] is finished or dropped is captured, on every channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NestedRecording`] if another recording is armed on
    /// the same adapter.
    pub fn begin_recording(&self) -> Result<Recording> {
        let id = self.adapter.arm()?;
        tracing::debug!(recording = id, "recording started");
        Ok(Recording {
            adapter: self.adapter.clone(),
            id,
            finished: false,
        })
    }
}

/// An armed recording window.
///
/// Call [`finish`](Self::finish) to disarm it and collect what was captured.
/// Dropping it unfinished (for example while unwinding from a panicking
/// action) disarms it and discards the capture.
pub struct Recording {
    adapter: TestAdapter,
    id: u64,
    finished: bool,
}

impl Recording {
    /// Disarm the window and return the captured broadcasts in publish order.
    pub fn finish(mut self) -> Vec<RecordedMessage> {
        self.finished = true;
        let messages = self.adapter.disarm(self.id);
        tracing::debug!(recording = self.id, messages = messages.len(), "recording finished");
        messages
    }
}

impl fmt::Debug for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recording")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Drop for Recording {
    fn drop(&mut self) {
        if !self.finished {
            let discarded = self.adapter.disarm(self.id);
            tracing::debug!(
                recording = self.id,
                discarded = discarded.len(),
                "recording abandoned"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use serde_json::json;

    use super::*;
    use crate::pubsub::InlineAdapter;

    #[test]
    fn inline_backend_is_rejected() {
        let inline = InlineAdapter::new();
        assert_eq!(Recorder::new(&inline).unwrap_err(), Error::TestAdapterRequired);
    }

    #[test]
    fn nested_recording_fails_fast() {
        let adapter = TestAdapter::new();
        let recorder = Recorder::new(&adapter).unwrap();
        let outer = recorder.begin_recording().unwrap();
        assert_eq!(
            recorder.begin_recording().unwrap_err(),
            Error::NestedRecording
        );
        assert!(outer.finish().is_empty());
    }

    #[test]
    fn recorders_on_the_same_adapter_share_the_slot() {
        let adapter = TestAdapter::new();
        let first = Recorder::new(&adapter).unwrap();
        let second = Recorder::new(&adapter.clone()).unwrap();

        let _armed = first.begin_recording().unwrap();
        assert_eq!(second.begin_recording().unwrap_err(), Error::NestedRecording);
    }

    #[test]
    fn finish_returns_messages_in_publish_order() {
        let adapter = TestAdapter::new();
        let recorder = Recorder::new(&adapter).unwrap();

        let recording = recorder.begin_recording().unwrap();
        adapter.broadcast(&"a".into(), json!(1)).unwrap();
        adapter.broadcast(&"b".into(), json!(2)).unwrap();
        adapter.broadcast(&"a".into(), json!(3)).unwrap();
        let messages = recording.finish();

        let sequences: Vec<_> = messages.iter().map(|m| m.sequence()).collect();
        assert_eq!(sequences, [0, 1, 2]);
        let payloads: Vec<_> = messages.iter().map(|m| m.payload().clone()).collect();
        assert_eq!(payloads, [json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn dropped_recording_disarms_the_adapter() {
        let adapter = TestAdapter::new();
        let recorder = Recorder::new(&adapter).unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _recording = recorder.begin_recording().unwrap();
            adapter.broadcast(&"stream".into(), json!("lost")).unwrap();
            panic!("action blew up");
        }));

        assert!(result.is_err());
        assert!(!adapter.is_recording());
        let recording = recorder.begin_recording().unwrap();
        assert!(recording.finish().is_empty());
    }
}
