//! # delcore Node
//!
//! The full delegate node: wires the store, cache, directory, signer, VM
//! boundary, and peer transport into the dpos service, seeds genesis
//! balances, and runs the workers and the RPC server.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod node;

pub use node::Node;
