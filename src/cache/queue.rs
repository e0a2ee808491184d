//! Per-client queue and statistics types
//!
//! A [`ClientQueue`] keeps the messages buffered for one client in delivery
//! order, next to the set of ids already buffered so duplicates are rejected
//! in constant time.

use std::collections::{HashSet, VecDeque};

use super::message::{CacheMessage, MessageId};

/// Ordered backlog of one client plus its dedup index
#[derive(Debug, Clone)]
pub struct ClientQueue<T> {
    /// Buffered messages, oldest first
    queue: VecDeque<CacheMessage<T>>,

    /// Ids of every message in `queue`
    seen: HashSet<MessageId>,
}

impl<T> ClientQueue<T> {
    pub(super) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Check whether a message with this id is buffered
    pub fn contains(&self, id: &MessageId) -> bool {
        self.seen.contains(id)
    }

    /// Append a message unless its id is already buffered
    ///
    /// Returns true if the message was appended.
    pub(super) fn push_if_new(&mut self, message: CacheMessage<T>) -> bool {
        if !self.seen.insert(message.id()) {
            return false;
        }
        self.queue.push_back(message);
        self.debug_check();
        true
    }

    /// Remove the message with this id from both the queue and the index
    ///
    /// Returns true if something was removed.
    pub(super) fn remove(&mut self, id: &MessageId) -> bool {
        if !self.seen.remove(id) {
            return false;
        }
        self.queue.retain(|m| m.id() != *id);
        self.debug_check();
        true
    }

    /// Number of buffered messages
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterate buffered messages in delivery order
    pub fn iter(&self) -> impl Iterator<Item = &CacheMessage<T>> {
        self.queue.iter()
    }

    /// Consume the queue, yielding payloads oldest first
    pub(super) fn into_payloads(self) -> Vec<T> {
        self.queue.into_iter().map(CacheMessage::into_payload).collect()
    }

    fn debug_check(&self) {
        debug_assert_eq!(
            self.queue.len(),
            self.seen.len(),
            "queue and dedup index diverged"
        );
    }
}

/// Point-in-time statistics for a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of clients tracked for idle expiry
    pub active_clients: usize,
    /// Number of clients with a non-empty backlog
    pub buffered_clients: usize,
    /// Total messages buffered across all clients
    pub buffered_messages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let mut queue = ClientQueue::new();
        for payload in ["a", "b", "c"] {
            assert!(queue.push_if_new(CacheMessage::new(payload)));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.into_payloads(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut queue = ClientQueue::new();
        let msg = CacheMessage::new("a");

        assert!(queue.push_if_new(msg.clone()));
        assert!(!queue.push_if_new(msg.clone()));
        assert!(!queue.push_if_new(CacheMessage::with_id(msg.id(), "other")));

        assert_eq!(queue.len(), 1);
        assert!(queue.contains(&msg.id()));
    }

    #[test]
    fn test_remove_clears_index() {
        let mut queue = ClientQueue::new();
        let a = CacheMessage::new("a");
        let b = CacheMessage::new("b");
        queue.push_if_new(a.clone());
        queue.push_if_new(b.clone());

        assert!(queue.remove(&a.id()));
        assert!(!queue.remove(&a.id()));
        assert!(!queue.contains(&a.id()));

        // Re-adding after removal is allowed again
        assert!(queue.push_if_new(a.clone()));
        let ids: Vec<_> = queue.iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![b.id(), a.id()]);
    }
}
