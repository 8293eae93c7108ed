//! Chat Room Example - Broadcast Matcher Demonstration
//!
//! A tiny chat service publishes through a [`Server`]:
//!
//! - Every posted message is broadcast to the room's channel
//! - Mentions are broadcast to the mentioned user's notification channel
//! - Moderated words are dropped before anything is broadcast
//!
//! The demo runs the service against a test-mode server and asserts on what
//! it broadcasts, the same way an integration test would.

use castcheck::{
    Channel, Error, Server, Streamable, expect, expect_future, have_broadcasted,
    matchers::{TWICE, ensure_eq, hash_including, have_broadcasted_to},
};
use serde::Serialize;
use serde_json::json;

// ============================================================================
// Domain Types
// ============================================================================

struct Room {
    id: u32,
}

impl Streamable for Room {
    fn to_stream_param(&self) -> String {
        format!("room-{}", self.id)
    }
}

struct User {
    name: String,
}

impl User {
    fn new(name: &str) -> Self {
        Self { name: name.into() }
    }
}

impl Streamable for User {
    fn to_stream_param(&self) -> String {
        format!("user-{}", self.name)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    author: &'a str,
    body: &'a str,
}

// ============================================================================
// Service
// ============================================================================

struct ChatService {
    server: Server,
    banned: Vec<&'static str>,
}

impl ChatService {
    fn post(&self, room: &Room, author: &User, body: &str) -> castcheck::Result {
        if self.banned.iter().any(|word| body.contains(word)) {
            tracing::info!(author = %author.name, "message dropped by moderation");
            return Ok(());
        }

        let message = ChatMessage {
            author: &author.name,
            body,
        };
        self.server
            .broadcast(Channel::broadcasting_for("chat", room), &message)?;

        for mention in body.split_whitespace().filter_map(|w| w.strip_prefix('@')) {
            self.server.broadcast(
                Channel::broadcasting_for("notifications", &User::new(mention)),
                &json!({"from": author.name, "room": room.id}),
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Broadcast Matcher Demonstration
// ============================================================================

#[tokio::main]
async fn main() -> castcheck::Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let server = Server::test();
    let chat = ChatService {
        server: server.clone(),
        banned: vec!["spoiler"],
    };
    let room = Room { id: 1 };
    let alice = User::new("alice");
    let bob = User::new("bob");

    println!("=== Broadcast Matcher Demonstration ===\n");

    println!("--- Test 1: One message, one broadcast ---");
    expect(&server, || chat.post(&room, &alice, "hello")).to(
        have_broadcasted_to(&room, "chat").with(json!({"author": "alice", "body": "hello"})),
    )?;
    println!("  ok");

    println!("\n--- Test 2: Mentions notify the user ---");
    expect(&server, || chat.post(&room, &alice, "hi @bob"))
        .to(have_broadcasted_to(&room, "chat")
            .with(hash_including(json!({"author": "alice"})))
            .and(
                have_broadcasted_to(&bob, "notifications")
                    .with(json!({"from": "alice", "room": 1})),
            ))?;
    println!("  ok");

    println!("\n--- Test 3: Moderated messages are not broadcast ---");
    expect(&server, || chat.post(&room, &bob, "big spoiler ahead"))
        .not_to(have_broadcasted_to(&room, "chat"))?;
    println!("  ok");

    println!("\n--- Test 4: Custom predicate ---");
    expect(&server, || {
        chat.post(&room, &alice, "one")?;
        chat.post(&room, &bob, "two")
    })
    .to(have_broadcasted("chat:room-1")
        .exactly(TWICE)
        .with_fn(|data| match data["body"].as_str() {
            Some(_) => Ok(()),
            None => ensure_eq(data, json!({"body": "<string>"})),
        }))?;
    println!("  ok");

    println!("\n--- Test 5: Failure report ---");
    let err = expect(&server, || chat.post(&room, &alice, "hello again"))
        .to(have_broadcasted_to(&room, "chat").with(hash_including(json!({"author": "bob"}))))
        .expect_err("alice posted, not bob");
    if let Error::Assertion(failure) = &err {
        println!("{}", failure.message());
    }

    println!("\n--- Test 6: Broadcasts from spawned tasks ---");
    let worker = chat.server.clone();
    expect_future(&server, async move {
        let handle = tokio::spawn(async move {
            worker.broadcast("presence", &json!({"user": "alice", "online": true}))
        });
        handle.await.map_err(Error::external)?
    })
    .to(have_broadcasted("presence").with(hash_including(json!({"online": true}))))
    .await?;
    println!("  ok");

    let history = server
        .test_adapter()
        .map(|adapter| adapter.broadcasts("chat:room-1").len())
        .unwrap_or_default();
    println!("\n=== Done: {history} messages broadcast to chat:room-1 ===");
    Ok(())
}
