use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sender used for block-reward issuance (no real sender behind it).
pub const REWARD_SENDER: &str = "00";

/// An unsigned value transfer between two address strings.
///
/// Field order matters: it is part of the block digest preimage, so every node
/// must serialize transactions identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub amount: f64,
    pub sender: String,
    pub recipient: String,
    pub transaction_id: String,
}

impl Transaction {
    /// Build a transaction with a fresh identifier.
    pub fn new(amount: f64, sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            amount,
            sender: sender.into(),
            recipient: recipient.into(),
            transaction_id: new_identifier(),
        }
    }

    /// Whether `address` appears on either side of the transfer.
    pub fn involves(&self, address: &str) -> bool {
        self.sender == address || self.recipient == address
    }
}

/// Random 128-bit token rendered as 32 hex chars (uuid v4 without dashes).
pub fn new_identifier() -> String {
    Uuid::new_v4().simple().to_string()
}
