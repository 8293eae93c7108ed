//! # Castcheck
//!
//! Assertion matchers for code that broadcasts over pub/sub channels.
//!
//! Castcheck lets a test run a block of application code and then assert on
//! what that block broadcast: to which channel, how many times and with which
//! payload. Broadcasts go through a [`Server`]; in tests the server is backed
//! by a [`TestAdapter`](pubsub::TestAdapter) that records them.
//!
//! ## Quick Start
//!
//! ```rust
//! use castcheck::{Server, expect, have_broadcasted, matchers::hash_including};
//! use serde_json::json;
//!
//! let server = Server::test();
//!
//! expect(&server, || {
//!     server.broadcast("chat_room_1", &json!({"author": "alice", "body": "hi"}))
//! })
//! .to(have_broadcasted("chat_room_1").with(hash_including(json!({"author": "alice"}))))?;
//! # Ok::<(), castcheck::Error>(())
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Server`] | Encodes payloads as JSON and publishes them through a backend |
//! | [`PubSub`](pubsub::PubSub) | Backend trait; [`TestAdapter`](pubsub::TestAdapter) records, [`InlineAdapter`](pubsub::InlineAdapter) only delivers |
//! | [`Channel`] | Name of a broadcast destination |
//! | [`BroadcastMatcher`](matchers::BroadcastMatcher) | Count and payload constraints for one channel |
//! | [`Recorder`] | Low-level access to the recording window |
//! | [`Config`] | How failure reports are rendered |
//!
//! ## Evaluation
//!
//! [`expect`] defers the action. When a matcher is supplied the action runs
//! inside a recording window; every broadcast made through the test adapter
//! in that window is captured, then each matcher filters by its channel and
//! checks its count and payload constraints. Broadcasts made before or after
//! the action are never counted.
//!
//! Failures are reported as [`Error::Assertion`]. Errors returned by the
//! action, and failures raised by [`with_fn`](matchers::BroadcastMatcher::with_fn)
//! predicates, are passed through unchanged.
//!
//! ## Examples
//!
//! See the `examples/` directory:
//!
//! - `chat.rs` - Asserting on a small chat service

mod channel;
mod config;
mod error;
mod expect;
mod message;
mod recorder;
mod server;

pub mod matchers;
pub mod pubsub;

pub use channel::{Channel, Streamable};
pub use config::Config;
pub use error::{AssertionFailure, Error, ErrorKind};
pub use expect::{Expect, ExpectFuture, expect, expect_future};
pub use matchers::{broadcast, have_broadcasted, have_broadcasted_to};
pub use message::RecordedMessage;
pub use recorder::{Recorder, Recording};
pub use server::Server;

/// Convenience alias for `Result<T, castcheck::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
