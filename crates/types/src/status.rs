//! Wire-visible status enumeration and the response envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire-visible outcome of an API operation or transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    /// Accepted, awaiting quorum and execution
    #[default]
    Pending,
    /// Executed and committed
    Ok,
    /// Requested entity does not exist
    NotFound,
    /// Hash, signature, or field validation failed
    InvalidTransaction,
    /// A transaction with this hash has already been committed
    DuplicateTransaction,
    /// A transaction with this hash is already being gossiped
    AlreadyProcessingTransaction,
    /// Arrived or executed outside the receive window
    TransactionTimeOut,
    /// Sender balance cannot cover the transfer
    InsufficientTokens,
    /// This node is not a member of the delegate set
    NotDelegate,
    /// No receipt was found for a gossip released to execution
    ReceiptNotFound,
    /// Unexpected store, VM, or internal failure
    InternalError,
    /// Unknown publish/subscribe topic
    TopicNotFound,
    /// Endpoint is recognized but not yet supported
    UnavailableFeature,
}

impl Status {
    /// Default human-readable phrasing for the status.
    pub fn human_readable(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Ok => "Ok",
            Status::NotFound => "Not found",
            Status::InvalidTransaction => "Invalid transaction",
            Status::DuplicateTransaction => "Duplicate transaction",
            Status::AlreadyProcessingTransaction => "Transaction is already being processed",
            Status::TransactionTimeOut => "Transaction was received later than the receive window",
            Status::InsufficientTokens => "Insufficient tokens",
            Status::NotDelegate => "This node is not a delegate",
            Status::ReceiptNotFound => "Receipt not found",
            Status::InternalError => "Internal error",
            Status::TopicNotFound => "Topic not found",
            Status::UnavailableFeature => "Feature not yet available",
        }
    }

    /// Whether the status is terminal for a transaction's lifecycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The response envelope returned by every API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// Operation outcome
    pub status: Status,
    /// Human-readable rendering of the outcome
    pub human_readable_status: String,
    /// Payload, when the operation produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    /// Creates a response with the status' default phrasing and no payload.
    pub fn with_status(status: Status) -> Self {
        Self {
            status,
            human_readable_status: status.human_readable().to_string(),
            data: None,
        }
    }

    /// Creates a response with explicit detail text.
    pub fn with_detail(status: Status, detail: impl Into<String>) -> Self {
        Self {
            status,
            human_readable_status: detail.into(),
            data: None,
        }
    }

    /// Creates an `Ok` response carrying a serialized payload.
    ///
    /// Serialization failure degrades to an `InternalError` response rather
    /// than panicking.
    pub fn ok_with_data<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                status: Status::Ok,
                human_readable_status: Status::Ok.human_readable().to_string(),
                data: Some(value),
            },
            Err(e) => Self::with_detail(Status::InternalError, e.to_string()),
        }
    }

    /// Attaches a serialized payload to the response.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => {
                self.data = Some(value);
                self
            }
            Err(e) => Self::with_detail(Status::InternalError, e.to_string()),
        }
    }
}
