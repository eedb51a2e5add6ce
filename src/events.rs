//! Ledger notification records and the topics that carry them.
//!
//! Payloads arrive as JSON in STOMP MESSAGE bodies. They are validated here,
//! at the boundary, so nothing downstream ever sees an empty identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Destination carrying block notifications.
pub const BLOCKS_TOPIC: &str = "/topic/blocks";

/// Destination carrying transaction notifications.
pub const TRANSACTIONS_TOPIC: &str = "/topic/txs";

/// The two notification topics the dashboard consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// New blocks.
    Blocks,
    /// New transactions.
    Transactions,
}

impl Topic {
    /// Both topics, in subscription order.
    pub const ALL: [Topic; 2] = [Topic::Blocks, Topic::Transactions];

    /// Returns the STOMP destination for this topic.
    pub fn destination(self) -> &'static str {
        match self {
            Topic::Blocks => BLOCKS_TOPIC,
            Topic::Transactions => TRANSACTIONS_TOPIC,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.destination())
    }
}

/// A block announced by the node.
///
/// Only `hash` is required. The remaining fields are filled when the node
/// includes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockEvent {
    /// Block hash (hex string).
    pub hash: String,
    /// Block height.
    #[serde(default)]
    pub index: Option<u64>,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Address of the block producer.
    #[serde(default)]
    pub author: Option<String>,
    /// Number of transactions in the block body.
    #[serde(default)]
    pub body_length: Option<u64>,
    /// Hash of the parent block.
    #[serde(default)]
    pub prev_block_hash: Option<String>,
}

/// A transaction announced by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    /// Transaction hash (hex string).
    pub tx_hash: String,
    /// Branch the transaction belongs to.
    #[serde(default)]
    pub branch_id: Option<String>,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Address of the sender.
    #[serde(default)]
    pub author: Option<String>,
    /// Size of the transaction body in bytes.
    #[serde(default)]
    pub body_length: Option<u64>,
}

/// Reasons a payload is rejected.
#[derive(Error, Debug)]
pub enum EventError {
    /// The body is not JSON of the expected shape.
    #[error("malformed {topic} payload: {source}")]
    Malformed {
        /// Topic the payload arrived on.
        topic: Topic,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The identifying field is empty or whitespace.
    #[error("{topic} payload has an empty `{field}`")]
    EmptyIdentifier {
        /// Topic the payload arrived on.
        topic: Topic,
        /// Name of the empty field as it appears on the wire.
        field: &'static str,
    },
}

/// Parses and validates a block payload.
pub fn parse_block(body: &str) -> Result<BlockEvent, EventError> {
    let event: BlockEvent = serde_json::from_str(body).map_err(|source| EventError::Malformed {
        topic: Topic::Blocks,
        source,
    })?;
    if event.hash.trim().is_empty() {
        return Err(EventError::EmptyIdentifier {
            topic: Topic::Blocks,
            field: "hash",
        });
    }
    Ok(event)
}

/// Parses and validates a transaction payload.
pub fn parse_transaction(body: &str) -> Result<TransactionEvent, EventError> {
    let event: TransactionEvent =
        serde_json::from_str(body).map_err(|source| EventError::Malformed {
            topic: Topic::Transactions,
            source,
        })?;
    if event.tx_hash.trim().is_empty() {
        return Err(EventError::EmptyIdentifier {
            topic: Topic::Transactions,
            field: "txHash",
        });
    }
    Ok(event)
}
