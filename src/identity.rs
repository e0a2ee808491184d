//! Client identity resolution
//!
//! The transport layer owns the connection objects; the cache only needs a
//! stable string for each logical client. A WebSocket connection is
//! identified by the resource that performed the initial handshake, so the
//! id used while caching for it differs from the id of the request that
//! carries it.

use crate::cache::ClientId;

/// Transport a client resource is attached through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    WebSocket,
    LongPolling,
    Streaming,
    ServerSentEvents,
    Polling,
}

/// A connection handle that can name the logical client behind it
pub trait ClientResource {
    /// Id of this connection's resource
    fn id(&self) -> ClientId;

    /// Transport the resource is attached through
    fn transport(&self) -> Transport;

    /// Id of the suspended resource a WebSocket frame belongs to, if known
    fn suspended_id(&self) -> Option<ClientId> {
        None
    }

    /// Steady-state id used when buffering for this resource
    ///
    /// Falls back to [`id`](Self::id) when a WebSocket resource does not
    /// carry a suspended id.
    fn cache_id(&self) -> ClientId {
        match self.transport() {
            Transport::WebSocket => self.suspended_id().unwrap_or_else(|| self.id()),
            _ => self.id(),
        }
    }
}
