//! # delcore Storage
//!
//! Store backends and the persistent data layout.
//!
//! Two implementations of the `delcore_core::Store` trait are provided:
//!
//! - [`MemStore`] - a versioned in-memory map with optimistic conflict
//!   detection; the default for tests and single-process runs
//! - [`RocksStore`] - RocksDB optimistic transactions for durable nodes
//!
//! The [`keys`] module defines the key layout (`tx:`, `txFrom:`, `txTo:`,
//! `receipt:`, `gossip:`, `account:`) and [`model`] layers typed accessors
//! and pagination over raw transactions.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod keys;
pub mod mem;
pub mod model;
pub mod rocks;

pub use mem::MemStore;
pub use rocks::RocksStore;
