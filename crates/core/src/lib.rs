//! # delcore Core
//!
//! Collaborator traits consumed by the transaction admission and execution
//! core. The core never talks to a concrete database, network stack, VM, or
//! clock; it goes through the seams defined here:
//!
//! - [`Store`] / [`StoreTxn`] - durable key-value backing with atomic
//!   multi-key transactions and conflict detection
//! - [`Directory`] - delegate membership and self identity
//! - [`Clock`] - time source (swappable for tests)
//! - [`Signer`] - this node's rumor-signing identity
//! - [`PeerClient`] - the peer gossip exchange transport
//! - [`Publisher`] - publish/subscribe hand-off

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod traits;

pub use traits::clock::{Clock, ManualClock, SystemClock};
pub use traits::directory::{Directory, StaticDirectory};
pub use traits::peer::{PeerClient, PeerError};
pub use traits::pubsub::{PublishError, Publisher, SubscriptionRequest, TopicRegistry};
pub use traits::signer::{KeypairSigner, Signer, SignerError};
pub use traits::store::{Store, StoreError, StoreResult, StoreTxn};
