//! Reconnecting subscriber demo
//!
//! Run with: cargo run --example reconnect
//!
//! Simulates a chat broadcaster with three subscribers:
//!
//! - `alice` reconnects regularly and receives everything published while
//!   she was away, exactly once
//! - `bob` connects through WebSocket; frames queued before flush are cached
//!   under his handshake resource and drained when he polls again
//! - `carol` disappears for good and is evicted with her backlog once she has
//!   been idle longer than the threshold
//!
//! Set `RUST_LOG=broadcast_cache=trace` to see every cache operation.

use std::sync::Arc;
use std::time::Duration;

use broadcast_cache::{BroadcasterCache, CacheConfig, ClientId, ClientResource, Transport};
use bytes::Bytes;

/// A connection as the transport layer would hand it over
struct Connection {
    id: &'static str,
    transport: Transport,
    handshake: Option<&'static str>,
}

impl ClientResource for Connection {
    fn id(&self) -> ClientId {
        ClientId::from(self.id)
    }

    fn transport(&self) -> Transport {
        self.transport
    }

    fn suspended_id(&self) -> Option<ClientId> {
        self.handshake.map(ClientId::from)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("broadcast_cache=debug".parse()?)
                .add_directive("reconnect=debug".parse()?),
        )
        .init();

    let config = CacheConfig::default()
        .client_idle_time(Duration::from_millis(600))
        .sweep_interval(Duration::from_millis(100));
    config.validate()?;

    let cache: Arc<BroadcasterCache<Bytes>> = Arc::new(BroadcasterCache::with_config(config));
    cache.start().await?;

    let alice = Connection {
        id: "alice",
        transport: Transport::LongPolling,
        handshake: None,
    };
    let bob_frame = Connection {
        id: "bob-frame-7",
        transport: Transport::WebSocket,
        handshake: Some("bob"),
    };
    let bob_poll = Connection {
        id: "bob",
        transport: Transport::LongPolling,
        handshake: None,
    };
    let carol = Connection {
        id: "carol",
        transport: Transport::ServerSentEvents,
        handshake: None,
    };

    // Everybody connects once so the cache knows them
    for conn in [&alice, &bob_poll, &carol] {
        cache.retrieve_from_cache("/chat", conn).await;
    }

    // Nobody is listening: broadcast is buffered for every known client
    cache
        .add_to_cache::<Connection>("/chat", None, Bytes::from_static(b"welcome"))
        .await;

    // A WebSocket frame that could not be flushed
    cache
        .add_to_cache("/chat", Some(&bob_frame), Bytes::from_static(b"dm for bob"))
        .await;

    for round in 0..4 {
        tokio::time::sleep(Duration::from_millis(250)).await;

        let message = format!("tick {round}");
        cache.add(None, Bytes::from(message)).await;

        let backlog = cache.retrieve_from_cache("/chat", &alice).await;
        tracing::info!(client = "alice", received = ?backlog, "Reconnected");

        if round % 2 == 1 {
            let backlog = cache.retrieve_from_cache("/chat", &bob_poll).await;
            tracing::info!(client = "bob", received = ?backlog, "Reconnected");
        }
    }

    let stats = cache.stats().await;
    tracing::info!(
        active = stats.active_clients,
        buffered = stats.buffered_messages,
        carol_known = cache.active_clients().await.contains_key(&carol.id()),
        "Final cache state"
    );

    cache.stop().await;
    Ok(())
}
