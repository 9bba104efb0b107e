//! Publish/subscribe hand-off.
//!
//! Delivery semantics (retry, ordering) belong to the pub/sub collaborator;
//! the core only creates subscriptions and fires events at topics.

use delcore_types::H256;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// A request to subscribe an endpoint to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    /// Topic name, e.g. `receipts`
    pub topic: String,
    /// Callback endpoint to deliver events to
    pub endpoint: String,
    /// Headers to send with each delivery
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Subscriber address
    pub address: String,
}

/// Errors surfaced by the pub/sub collaborator.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The topic does not exist.
    #[error("topic not found: {0}")]
    TopicNotFound(String),

    /// Delivery-side failure.
    #[error("delivery error: {0}")]
    Delivery(String),
}

/// Publish/subscribe hand-off consumed by the core.
pub trait Publisher: Send + Sync {
    /// Registers a subscription and returns its handle hash.
    fn create_subscription(&self, req: &SubscriptionRequest) -> Result<H256, PublishError>;

    /// Fires an event at a topic.
    fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<(), PublishError>;
}

/// An in-process topic registry with a fixed topic set.
///
/// Subscriptions are held in memory; actual delivery is the collaborator's
/// concern and is reduced here to a debug log per event.
pub struct TopicRegistry {
    topics: HashSet<String>,
    subscriptions: RwLock<HashMap<H256, SubscriptionRequest>>,
}

impl TopicRegistry {
    /// Creates a registry over the given topics.
    pub fn new<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }
}

impl Publisher for TopicRegistry {
    fn create_subscription(&self, req: &SubscriptionRequest) -> Result<H256, PublishError> {
        if !self.topics.contains(&req.topic) {
            return Err(PublishError::TopicNotFound(req.topic.clone()));
        }
        let hash = H256::keccak256_concat(&[
            req.topic.as_bytes(),
            req.endpoint.as_bytes(),
            req.address.as_bytes(),
        ]);
        self.subscriptions.write().insert(hash, req.clone());
        debug!(topic = %req.topic, endpoint = %req.endpoint, "subscription created");
        Ok(hash)
    }

    fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<(), PublishError> {
        if !self.topics.contains(topic) {
            return Err(PublishError::TopicNotFound(topic.to_string()));
        }
        let subscribers = self
            .subscriptions
            .read()
            .values()
            .filter(|s| s.topic == topic)
            .count();
        debug!(topic, subscribers, %payload, "event published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(topic: &str) -> SubscriptionRequest {
        SubscriptionRequest {
            topic: topic.into(),
            endpoint: "http://localhost:9000/hook".into(),
            headers: HashMap::new(),
            address: "0xabc".into(),
        }
    }

    #[test]
    fn test_unknown_topic_is_rejected() {
        let registry = TopicRegistry::new(["receipts"]);
        let err = registry.create_subscription(&request("blocks")).unwrap_err();
        assert!(matches!(err, PublishError::TopicNotFound(_)));
    }

    #[test]
    fn test_subscription_handle_is_stable() {
        let registry = TopicRegistry::new(["receipts"]);
        let a = registry.create_subscription(&request("receipts")).unwrap();
        let b = registry.create_subscription(&request("receipts")).unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.subscription_count(), 1);
    }

    #[test]
    fn test_publish_requires_topic() {
        let registry = TopicRegistry::new(["receipts"]);
        assert!(registry.publish("receipts", &serde_json::json!({})).is_ok());
        assert!(registry.publish("nope", &serde_json::json!({})).is_err());
    }
}
