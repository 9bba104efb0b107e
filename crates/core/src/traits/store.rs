//! Durable key-value store abstraction with transactional semantics.
//!
//! The store supports atomic multi-key read-write transactions with
//! optimistic conflict detection: a commit fails with
//! [`StoreError::Conflict`] when another transaction committed a key this
//! one read before it could commit. The execution worker relies on that to
//! recover silently when two delegates race on the same transaction hash.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested key was not found.
    #[error("key not found")]
    NotFound,

    /// The transaction lost an optimistic-concurrency race; the caller may
    /// retry or, when another writer committed the same logical change,
    /// treat the commit as done.
    #[error("transaction conflict")]
    Conflict,

    /// A write was attempted through a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,

    /// The transaction was already committed or discarded.
    #[error("transaction already finished")]
    Finished,

    /// A backend I/O error occurred.
    #[error("store i/o error: {0}")]
    Io(String),

    /// Value (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A transactional key-value store.
///
/// Implementations must be thread-safe; each worker iteration opens its own
/// transaction.
pub trait Store: Send + Sync {
    /// Begins a new transaction.
    ///
    /// Writes through a transaction opened with `writable = false` fail
    /// with [`StoreError::ReadOnly`].
    fn begin(&self, writable: bool) -> Box<dyn StoreTxn + '_>;
}

/// A single store transaction.
///
/// Reads observe a consistent snapshot plus the transaction's own writes.
/// Nothing is visible to other transactions until [`StoreTxn::commit`]
/// succeeds; dropping or [`StoreTxn::discard`]ing a transaction abandons
/// its writes.
pub trait StoreTxn {
    /// Reads a key. Returns `Ok(None)` when the key does not exist.
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Buffers a write.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Buffers a deletion.
    fn delete(&mut self, key: &[u8]) -> StoreResult<()>;

    /// Returns up to `limit` key/value pairs whose key starts with
    /// `prefix`, in key order, skipping the first `offset` matches.
    fn scan_prefix(
        &mut self,
        prefix: &[u8],
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Atomically applies every buffered write.
    fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Abandons the transaction.
    fn discard(self: Box<Self>);
}
