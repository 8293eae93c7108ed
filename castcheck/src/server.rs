use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    Channel, Config, Result,
    pubsub::{Callback, PubSub, SubscriptionId, TestAdapter},
};

/// Application-facing broadcaster.
///
/// A `Server` owns the pub/sub backend it was constructed with; there is no
/// process-wide instance to swap out. Code under test receives the server
/// (or a clone, which shares the backend) and tests build it with a
/// [`TestAdapter`] so the matchers can observe what it publishes.
///
/// Payloads are encoded with `serde_json` before they reach the backend, so
/// subscribers and matchers both see the JSON shape of the value.
///
/// # Example
///
/// ```
/// use castcheck::{Server, have_broadcasted, expect};
/// use serde_json::json;
///
/// let server = Server::test();
///
/// expect(&server, || server.broadcast("chat", &json!({"body": "hi"})))
///     .to(have_broadcasted("chat"))?;
/// # Ok::<(), castcheck::Error>(())
/// ```
#[derive(Clone)]
pub struct Server {
    pubsub: Arc<dyn PubSub>,
    config: Arc<Config>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("test_mode", &self.pubsub.as_test_adapter().is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Create a server broadcasting through `pubsub` with the default [`Config`].
    pub fn new<P: PubSub + 'static>(pubsub: P) -> Self {
        Self::with_config(pubsub, Config::default())
    }

    pub fn with_config<P: PubSub + 'static>(pubsub: P, config: Config) -> Self {
        Self {
            pubsub: Arc::new(pubsub),
            config: Arc::new(config),
        }
    }

    /// Create a server backed by a fresh [`TestAdapter`].
    pub fn test() -> Self {
        Self::new(TestAdapter::new())
    }

    /// Encode `payload` as JSON and publish it to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`](crate::Error::Encode) if the payload cannot be
    /// represented as JSON, or whatever the backend reports.
    pub fn broadcast<P>(&self, channel: impl Into<Channel>, payload: &P) -> Result
    where
        P: Serialize + ?Sized,
    {
        let channel = channel.into();
        let payload = serde_json::to_value(payload)?;
        self.pubsub.broadcast(&channel, payload)
    }

    /// Register `callback` for broadcasts on `channel`.
    pub fn subscribe<F>(&self, channel: impl Into<Channel>, callback: F) -> SubscriptionId
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        self.pubsub.subscribe(&channel.into(), callback)
    }

    pub fn unsubscribe(&self, channel: impl Into<Channel>, id: SubscriptionId) -> bool {
        self.pubsub.unsubscribe(&channel.into(), id)
    }

    /// Returns the backend this server broadcasts through.
    pub fn pubsub(&self) -> &dyn PubSub {
        self.pubsub.as_ref()
    }

    /// Returns the test adapter, if the server runs in test mode.
    pub fn test_adapter(&self) -> Option<&TestAdapter> {
        self.pubsub.as_test_adapter()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
