//! Identifier and message types
//!
//! This module defines the key types for identifying clients and the messages
//! buffered on their behalf.

use std::borrow::Borrow;

use bytes::Bytes;
use uuid::Uuid;

/// Stable identity of a logical client across reconnects
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    /// Create a new client id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ClientId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache-assigned message identifier (random 128 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generate a fresh random id
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// A payload paired with the id the cache deduplicates on
///
/// Cloning is as cheap as cloning the payload; with the default `Bytes`
/// payload every client queue shares one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMessage<T = Bytes> {
    id: MessageId,
    payload: T,
}

impl<T> CacheMessage<T> {
    /// Wrap a payload under a freshly generated id
    pub fn new(payload: T) -> Self {
        Self::with_id(MessageId::random(), payload)
    }

    /// Wrap a payload under an existing id
    pub fn with_id(id: MessageId, payload: T) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Unwrap the payload
    pub fn into_payload(self) -> T {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = CacheMessage::new(Bytes::from_static(b"x"));
        let b = CacheMessage::new(Bytes::from_static(b"x"));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.payload(), b.payload());
    }

    #[test]
    fn test_with_id_keeps_id() {
        let id = MessageId::random();
        let msg = CacheMessage::with_id(id, "hello");
        assert_eq!(msg.id(), id);
        assert_eq!(msg.into_payload(), "hello");
    }

    #[test]
    fn test_client_id() {
        let id = ClientId::from("client-1");
        assert_eq!(id.as_str(), "client-1");
        assert_eq!(id.to_string(), "client-1");
        assert_eq!(id, ClientId::new(String::from("client-1")));
    }
}
