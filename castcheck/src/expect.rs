use std::fmt;

use crate::{
    AssertionFailure, Config, Error, RecordedMessage, Recorder, Result, Server,
    matchers::{BroadcastMatcher, Compound, MatchResult},
};

const COMPOUND_SEPARATOR: &str = "\n\n   ...and:\n\n";

/// Start an expectation about what `action` broadcasts through `server`.
///
/// The action is deferred: it only runs once a matcher is supplied with
/// [`Expect::to`] or [`Expect::not_to`], inside a recording window armed on
/// the server's test adapter. Passing anything other than a closure is a
/// compile error:
///
/// ```compile_fail
/// use castcheck::{Server, expect, have_broadcasted};
///
/// let server = Server::test();
/// expect(&server, server.broadcast("stream", "already sent"))
///     .to(have_broadcasted("stream"));
/// ```
///
/// # Example
///
/// ```
/// use castcheck::{Server, expect, have_broadcasted};
/// use serde_json::json;
///
/// let server = Server::test();
///
/// let id = expect(&server, || {
///     server.broadcast("stream", &json!({"id": 42}))?;
///     Ok(42)
/// })
/// .to(have_broadcasted("stream").with(json!({"id": 42})))?;
///
/// assert_eq!(id, 42);
/// # Ok::<(), castcheck::Error>(())
/// ```
pub fn expect<F, R>(server: &Server, action: F) -> Expect<'_, F>
where
    F: FnOnce() -> Result<R>,
{
    Expect { server, action }
}

/// Start an expectation about what `future` broadcasts through `server`.
///
/// The recording window stays armed across every `.await` inside the
/// future, so broadcasts from tasks it spawns and joins are captured too.
///
/// ```
/// use castcheck::{Server, expect_future, have_broadcasted};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> castcheck::Result {
/// let server = Server::test();
///
/// expect_future(&server, async {
///     tokio::task::yield_now().await;
///     server.broadcast("stream", "later")
/// })
/// .to(have_broadcasted("stream"))
/// .await?;
/// # Ok(())
/// # }
/// ```
pub fn expect_future<Fut, R>(server: &Server, future: Fut) -> ExpectFuture<'_, Fut>
where
    Fut: Future<Output = Result<R>>,
{
    ExpectFuture { server, future }
}

/// A pending expectation over a synchronous action.
///
/// Created by [`expect`].
pub struct Expect<'a, F> {
    server: &'a Server,
    action: F,
}

impl<'a, F, R> Expect<'a, F>
where
    F: FnOnce() -> Result<R>,
{
    /// Run the action and require every matcher to pass.
    ///
    /// Returns the action's own value on success.
    ///
    /// # Errors
    ///
    /// - [`Error::TestAdapterRequired`] if the server is not in test mode.
    /// - [`Error::NestedRecording`] if another expectation is running on
    ///   the same adapter.
    /// - Whatever the action returns, unchanged; matchers are not evaluated.
    /// - [`Error::Predicate`] if a custom payload predicate fails.
    /// - [`Error::Assertion`] if a matcher is not satisfied.
    pub fn to(self, matcher: impl Into<Compound>) -> Result<R> {
        let server = self.server;
        let (value, messages) = self.record()?;
        verify(matcher.into(), &messages, server.config())?;
        Ok(value)
    }

    /// Run the action and require the matcher to fail.
    ///
    /// Only single matchers can be negated.
    pub fn not_to(self, matcher: BroadcastMatcher) -> Result<R> {
        let server = self.server;
        let (value, messages) = self.record()?;
        refute(matcher, &messages, server.config())?;
        Ok(value)
    }

    fn record(self) -> Result<(R, Vec<RecordedMessage>)> {
        let recording = Recorder::new(self.server.pubsub())?.begin_recording()?;
        // A panicking action drops `recording`, which disarms the adapter.
        let out = (self.action)();
        let messages = recording.finish();
        Ok((out?, messages))
    }
}

impl<F> fmt::Debug for Expect<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expect")
            .field("server", self.server)
            .finish_non_exhaustive()
    }
}

/// A pending expectation over a future.
///
/// Created by [`expect_future`].
pub struct ExpectFuture<'a, Fut> {
    server: &'a Server,
    future: Fut,
}

impl<'a, Fut, R> ExpectFuture<'a, Fut>
where
    Fut: Future<Output = Result<R>>,
{
    /// Await the future and require every matcher to pass.
    ///
    /// Errors are the same as for [`Expect::to`].
    pub async fn to(self, matcher: impl Into<Compound>) -> Result<R> {
        let matcher = matcher.into();
        let server = self.server;
        let (value, messages) = self.record().await?;
        verify(matcher, &messages, server.config())?;
        Ok(value)
    }

    /// Await the future and require the matcher to fail.
    pub async fn not_to(self, matcher: BroadcastMatcher) -> Result<R> {
        let server = self.server;
        let (value, messages) = self.record().await?;
        refute(matcher, &messages, server.config())?;
        Ok(value)
    }

    async fn record(self) -> Result<(R, Vec<RecordedMessage>)> {
        let recording = Recorder::new(self.server.pubsub())?.begin_recording()?;
        let out = self.future.await;
        let messages = recording.finish();
        Ok((out?, messages))
    }
}

impl<Fut> fmt::Debug for ExpectFuture<'_, Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectFuture")
            .field("server", self.server)
            .finish_non_exhaustive()
    }
}

// ===== Verdicts =====

fn verify(compound: Compound, messages: &[RecordedMessage], config: &Config) -> Result {
    let mut failures: Vec<MatchResult> = Vec::new();
    for matcher in compound.into_matchers() {
        let result = matcher.evaluate_with(messages, config)?;
        if !result.success() {
            failures.push(result);
        }
    }

    if failures.is_empty() {
        return Ok(());
    }
    let message = failures
        .iter()
        .map(MatchResult::failure_message)
        .collect::<Vec<_>>()
        .join(COMPOUND_SEPARATOR);
    Err(Error::Assertion(AssertionFailure::new(message, failures)))
}

fn refute(matcher: BroadcastMatcher, messages: &[RecordedMessage], config: &Config) -> Result {
    let result = matcher.evaluate_with(messages, config)?;
    if !result.success() {
        return Ok(());
    }
    let message = result.negated_failure_message();
    Err(Error::Assertion(AssertionFailure::new(message, vec![result])))
}
