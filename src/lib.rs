//! # broadcast-cache
//!
//! Message retention for push servers whose clients disconnect and
//! reconnect: WebSocket, long-polling, streaming and SSE subscribers of a
//! broadcast channel.
//!
//! Messages published while a client is away are buffered under the
//! client's stable identity, delivered once when it comes back, deduplicated
//! by a cache-assigned id, and discarded if the client never returns.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use broadcast_cache::{BroadcasterCache, ClientId};
//!
//! # async fn demo() -> broadcast_cache::Result<()> {
//! let cache = Arc::new(BroadcasterCache::<Bytes>::new());
//! cache.start().await?;
//!
//! let client = ClientId::from("client-1");
//! cache.add(Some(&client), Bytes::from_static(b"hello")).await;
//!
//! let backlog = cache.retrieve(&client).await;
//! assert_eq!(backlog.len(), 1);
//!
//! cache.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod identity;

pub use cache::{
    BroadcasterCache, CacheConfig, CacheMessage, CacheStats, ClientId, ClientQueue, MessageId,
    ReaperState,
};
pub use error::{CacheError, Result};
pub use identity::{ClientResource, Transport};
