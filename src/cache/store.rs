//! Broadcaster cache implementation
//!
//! The central store that buffers messages for clients that are not
//! currently receiving and hands the backlog over when they come back.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::identity::ClientResource;

use super::config::CacheConfig;
use super::message::{CacheMessage, ClientId};
use super::queue::{CacheStats, ClientQueue};
use super::reaper::ReaperSlot;

/// Per-client message cache
///
/// Both maps live behind a single `Mutex` so that fan-out, drain and eviction
/// each see a consistent view of them. Critical sections only touch the maps;
/// payloads are never inspected.
pub struct BroadcasterCache<T = Bytes> {
    pub(super) state: Mutex<CacheState<T>>,
}

/// Everything guarded by the cache lock
pub(super) struct CacheState<T> {
    /// Buffered backlog per client
    messages: HashMap<ClientId, ClientQueue<T>>,

    /// Last time each known client was marked active
    active_clients: HashMap<ClientId, Instant>,

    /// Current configuration
    pub(super) config: CacheConfig,

    /// Background sweep bookkeeping
    pub(super) reaper: ReaperSlot,
}

impl<T: Clone> CacheState<T> {
    /// Append `message` for `client` unless it is already buffered there
    fn buffer_if_new(&mut self, client: &ClientId, message: &CacheMessage<T>) -> bool {
        buffer_into(&mut self.messages, client, message)
    }

    /// Buffer `message` for every client known at this instant
    fn buffer_for_all_active(&mut self, message: &CacheMessage<T>) -> usize {
        let Self {
            messages,
            active_clients,
            ..
        } = self;

        let mut queued = 0;
        for client in active_clients.keys() {
            if buffer_into(messages, client, message) {
                queued += 1;
            }
        }
        queued
    }
}

impl<T> CacheState<T> {
    fn new(config: CacheConfig) -> Self {
        Self {
            messages: HashMap::new(),
            active_clients: HashMap::new(),
            config,
            reaper: ReaperSlot::default(),
        }
    }

    /// Evict every client idle for longer than the configured threshold
    ///
    /// Buffered messages of evicted clients are dropped.
    pub(super) fn evict_idle(&mut self, now: Instant) -> usize {
        let idle = self.config.client_idle_time;

        let expired: Vec<ClientId> = self
            .active_clients
            .iter()
            .filter(|(_, last_seen)| now.saturating_duration_since(**last_seen) > idle)
            .map(|(client, _)| client.clone())
            .collect();

        for client in &expired {
            self.active_clients.remove(client);
            let dropped = self.messages.remove(client).map_or(0, |q| q.len());

            tracing::debug!(
                client = %client,
                dropped_messages = dropped,
                "Client evicted after idle timeout"
            );
        }

        self.debug_check();
        expired.len()
    }

    fn debug_check(&self) {
        debug_assert!(
            self.messages
                .keys()
                .all(|client| self.active_clients.contains_key(client)),
            "buffered client missing from active clients"
        );
    }
}

fn buffer_into<T: Clone>(
    messages: &mut HashMap<ClientId, ClientQueue<T>>,
    client: &ClientId,
    message: &CacheMessage<T>,
) -> bool {
    let queued = messages
        .entry(client.clone())
        .or_insert_with(ClientQueue::new)
        .push_if_new(message.clone());

    if !queued {
        tracing::debug!(
            client = %client,
            message_id = %message.id(),
            "Duplicate message ignored"
        );
    }

    queued
}

impl<T: Clone> BroadcasterCache<T> {
    /// Create a new cache with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a new cache with custom configuration
    ///
    /// The configuration is checked when the reaper starts; call
    /// [`CacheConfig::validate`] to reject bad values earlier.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState::new(config)),
        }
    }

    /// Get a copy of the current configuration
    pub async fn config(&self) -> CacheConfig {
        self.state.lock().await.config.clone()
    }

    /// Buffer a payload under a fresh message id
    ///
    /// With a target, the target is marked active and the message is queued
    /// for it alone. Without one, the message is queued for every client
    /// known at this instant; clients showing up afterwards do not get it.
    pub async fn add(&self, target: Option<&ClientId>, payload: T) -> CacheMessage<T> {
        let message = CacheMessage::new(payload);
        self.add_message(target, &message).await;
        message
    }

    /// Buffer an already created message, skipping clients that hold it
    ///
    /// Returns the number of client queues the message was appended to.
    pub async fn add_message(
        &self,
        target: Option<&ClientId>,
        message: &CacheMessage<T>,
    ) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        let queued = match target {
            Some(client) => {
                state.active_clients.insert(client.clone(), now);
                usize::from(state.buffer_if_new(client, message))
            }
            None => state.buffer_for_all_active(message),
        };

        state.debug_check();

        tracing::trace!(
            client = ?target.map(ClientId::as_str),
            message_id = %message.id(),
            queued = queued,
            "Message cached"
        );

        queued
    }

    /// Drain the backlog of a client, oldest message first
    ///
    /// Also marks the client active. The queue is taken out of the map under
    /// the lock, so each buffered message is returned by exactly one call.
    pub async fn retrieve(&self, client: &ClientId) -> Vec<T> {
        let now = Instant::now();

        let queue = {
            let mut state = self.state.lock().await;
            state.active_clients.insert(client.clone(), now);
            state.messages.remove(client)
        };

        let payloads = queue.map(ClientQueue::into_payloads).unwrap_or_default();

        tracing::trace!(
            client = %client,
            count = payloads.len(),
            "Cached messages retrieved"
        );

        payloads
    }

    /// Drop a buffered message that should no longer be delivered
    ///
    /// Does nothing if the client or the message is not buffered.
    pub async fn remove_message(&self, client: &ClientId, message: &CacheMessage<T>) {
        let mut state = self.state.lock().await;

        let Some(queue) = state.messages.get_mut(client) else {
            return;
        };

        if queue.remove(&message.id()) {
            if queue.is_empty() {
                state.messages.remove(client);
            }
            tracing::trace!(
                client = %client,
                message_id = %message.id(),
                "Cached message removed"
            );
        }
    }

    /// [`add`](Self::add) for a connection handle, resolved through
    /// [`ClientResource::cache_id`]
    pub async fn add_to_cache<R>(
        &self,
        broadcaster_id: &str,
        resource: Option<&R>,
        payload: T,
    ) -> CacheMessage<T>
    where
        R: ClientResource + ?Sized,
    {
        let client = resource.map(|r| r.cache_id());
        let message = self.add(client.as_ref(), payload).await;

        tracing::trace!(
            broadcaster = broadcaster_id,
            client = ?client.as_ref().map(ClientId::as_str),
            message_id = %message.id(),
            "Added to broadcaster cache"
        );

        message
    }

    /// [`retrieve`](Self::retrieve) for the connection a client polls through
    pub async fn retrieve_from_cache<R>(&self, broadcaster_id: &str, resource: &R) -> Vec<T>
    where
        R: ClientResource + ?Sized,
    {
        let client = resource.id();
        let payloads = self.retrieve(&client).await;

        tracing::trace!(
            broadcaster = broadcaster_id,
            client = %client,
            count = payloads.len(),
            "Retrieved from broadcaster cache"
        );

        payloads
    }

    /// [`remove_message`](Self::remove_message) for a connection handle
    pub async fn clear_cache<R>(
        &self,
        broadcaster_id: &str,
        resource: &R,
        message: &CacheMessage<T>,
    ) where
        R: ClientResource + ?Sized,
    {
        let client = resource.cache_id();
        tracing::trace!(
            broadcaster = broadcaster_id,
            client = %client,
            message_id = %message.id(),
            "Clearing cached message"
        );
        self.remove_message(&client, message).await;
    }

    /// Snapshot of every buffered backlog
    pub async fn messages(&self) -> HashMap<ClientId, Vec<CacheMessage<T>>> {
        let state = self.state.lock().await;
        state
            .messages
            .iter()
            .map(|(client, queue)| (client.clone(), queue.iter().cloned().collect()))
            .collect()
    }

    /// Snapshot of the last activity time of every known client
    pub async fn active_clients(&self) -> HashMap<ClientId, Instant> {
        self.state.lock().await.active_clients.clone()
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            active_clients: state.active_clients.len(),
            buffered_clients: state.messages.len(),
            buffered_messages: state.messages.values().map(ClientQueue::len).sum(),
        }
    }

    /// Forget every client and every buffered message
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.messages.clear();
        state.active_clients.clear();
        tracing::info!("Broadcaster cache cleared");
    }

    /// Run one idle sweep now
    ///
    /// Returns the number of evicted clients.
    pub async fn invalidate_expired_entries(&self) -> usize {
        let now = Instant::now();
        let evicted = self.state.lock().await.evict_idle(now);
        if evicted > 0 {
            tracing::debug!(evicted = evicted, "Idle sweep finished");
        }
        evicted
    }
}

impl<T: Clone> Default for BroadcasterCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
