use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::DIFFICULTY;
use crate::error::Result;
use crate::transaction::Transaction;

/// The hashed payload of a block: its transactions and its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockData {
    pub transactions: Vec<Transaction>,
    pub index: u64,
}

/// SHA-256 over `previous_hash ++ nonce ++ json(data)`, hex encoded.
pub fn digest(previous_hash: &str, data: &BlockData, nonce: u64) -> Result<String> {
    Ok(PreparedData::new(previous_hash, data)?.digest(nonce))
}

/// Whether `hash` carries the proof-of-work prefix of `DIFFICULTY` zeros.
pub fn meets_difficulty(hash: &str) -> bool {
    hash.len() >= DIFFICULTY && hash.bytes().take(DIFFICULTY).all(|b| b == b'0')
}

/// Preimage parts that stay fixed while only the nonce varies.
/// The payload is serialized once so a nonce search never re-encodes JSON.
#[derive(Debug, Clone)]
pub struct PreparedData {
    previous_hash: String,
    payload: Vec<u8>,
}

impl PreparedData {
    pub fn new(previous_hash: &str, data: &BlockData) -> Result<Self> {
        Ok(Self {
            previous_hash: previous_hash.to_string(),
            payload: serde_json::to_vec(data)?,
        })
    }

    pub fn digest(&self, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        hasher.update(&self.payload);
        hex::encode(hasher.finalize())
    }
}
