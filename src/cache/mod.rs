//! Per-client message cache for reconnecting subscribers
//!
//! The cache buffers broadcast messages for clients that are not currently
//! receiving them and hands the backlog over, exactly once, when the client
//! polls or reconnects. Clients that stay away longer than the idle threshold
//! are evicted by a background reaper together with their backlog.
//!
//! # Architecture
//!
//! ```text
//!                     Arc<BroadcasterCache>
//!               ┌────────────────────────────────┐
//!               │ Mutex<CacheState {             │
//!               │   messages: HashMap<ClientId,  │
//!               │     ClientQueue { queue, seen }│
//!               │   >,                           │
//!               │   active_clients: HashMap<     │
//!               │     ClientId, Instant>,        │
//!               │   config, reaper               │
//!               │ }>                             │
//!               └───────────────┬────────────────┘
//!                               │
//!      ┌────────────────────────┼─────────────────────────┐
//!      │                        │                         │
//!      ▼                        ▼                         ▼
//! [Publisher]             [Connection]               [Reaper task]
//! add(target, payload)    retrieve(client)           interval tick
//!      │                        │                         │
//!      └─► buffer-if-new        └─► take queue            └─► evict idle
//! ```
//!
//! # Delivery semantics
//!
//! A message added without a target is queued for every client known to the
//! cache at that instant. A client first seen afterwards does not receive it,
//! so broadcast buffering reaches the currently known clients only.

pub mod config;
pub mod message;
pub mod queue;
pub mod reaper;
pub mod store;

pub use config::CacheConfig;
pub use message::{CacheMessage, ClientId, MessageId};
pub use queue::{CacheStats, ClientQueue};
pub use reaper::ReaperState;
pub use store::BroadcasterCache;
