//! The quorum priority queue releasing gossips for execution.

use delcore_types::{Gossip, H256};
use parking_lot::Mutex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Heap entry ordered by transaction time, oldest first, with the
/// transaction hash as a deterministic tie-break.
struct QueueEntry {
    time: u64,
    hash: H256,
    gossip: Gossip,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.hash == other.hash
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the oldest timestamp (and the
        // lexicographically smallest hash on ties) surfaces first.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.hash.cmp(&self.hash))
    }
}

/// A snapshot row for observability dumps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Queued transaction hash
    pub transaction_hash: H256,
    /// Queue priority (the transaction's timestamp)
    pub time: u64,
    /// Rumors carried by the queued gossip
    pub rumors: usize,
}

#[derive(Default)]
struct QueueInner {
    heap: BinaryHeap<QueueEntry>,
    hashes: HashSet<H256>,
}

/// Min-heap of gossips keyed by transaction time.
///
/// An auxiliary hash set deduplicates pushes so a transaction is queued at
/// most once while it awaits execution. All operations serialize under a
/// single mutex.
#[derive(Default)]
pub struct GossipQueue {
    inner: Mutex<QueueInner>,
}

impl GossipQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a gossip unless its transaction hash is already queued.
    ///
    /// Returns true if the gossip was inserted.
    pub fn push(&self, gossip: Gossip) -> bool {
        let mut inner = self.inner.lock();
        let hash = gossip.transaction.hash;
        if !inner.hashes.insert(hash) {
            return false;
        }
        inner.heap.push(QueueEntry {
            time: gossip.transaction.time,
            hash,
            gossip,
        });
        true
    }

    /// Whether a gossip for `hash` is queued.
    pub fn exists(&self, hash: &H256) -> bool {
        self.inner.lock().hashes.contains(hash)
    }

    /// Whether anything is ready to execute.
    pub fn has_available(&self) -> bool {
        !self.inner.lock().heap.is_empty()
    }

    /// Removes and returns the earliest-timestamp gossip.
    pub fn pop(&self) -> Option<Gossip> {
        let mut inner = self.inner.lock();
        let entry = inner.heap.pop()?;
        inner.hashes.remove(&entry.hash);
        Some(entry.gossip)
    }

    /// The earliest queued transaction time, if any.
    pub fn peek_priority(&self) -> Option<u64> {
        self.inner.lock().heap.peek().map(|e| e.time)
    }

    /// Number of queued gossips.
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    /// A snapshot of the queue contents for observability.
    pub fn dump(&self) -> Vec<QueueSnapshot> {
        let inner = self.inner.lock();
        let mut rows: Vec<QueueSnapshot> = inner
            .heap
            .iter()
            .map(|e| QueueSnapshot {
                transaction_hash: e.hash,
                time: e.time,
                rumors: e.gossip.rumors.len(),
            })
            .collect();
        rows.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| {
            a.transaction_hash.cmp(&b.transaction_hash)
        }));
        rows
    }
}
