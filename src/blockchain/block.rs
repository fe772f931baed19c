use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::GENESIS_HASH;
use super::hasher::{self, BlockData};
use crate::error::Result;
use crate::transaction::Transaction;

/// A sealed block. Immutable once appended to a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix millis (UTC), not hashed
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub hash: String,
    #[serde(rename = "previousBlockHash")]
    pub previous_hash: String,
}

impl Block {
    /// The fixed first block every node starts from.
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp: Utc::now().timestamp_millis(),
            transactions: Vec::new(),
            nonce: 0,
            hash: String::from(GENESIS_HASH),
            previous_hash: String::from(GENESIS_HASH),
        }
    }

    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        nonce: u64,
        previous_hash: String,
        hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: Utc::now().timestamp_millis(),
            transactions,
            nonce,
            hash,
            previous_hash,
        }
    }

    /// Whether this block has the exact shape of the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 1
            && self.nonce == 0
            && self.previous_hash == GENESIS_HASH
            && self.hash == GENESIS_HASH
            && self.transactions.is_empty()
    }

    /// The payload covered by the digest.
    pub fn data(&self) -> BlockData {
        BlockData {
            transactions: self.transactions.clone(),
            index: self.index,
        }
    }

    /// Recompute the digest from the block's own fields.
    pub fn compute_hash(&self) -> Result<String> {
        hasher::digest(&self.previous_hash, &self.data(), self.nonce)
    }

    /// Stored hash matches its content and satisfies the PoW prefix.
    /// (Does NOT validate chain linkage.)
    pub fn has_valid_proof(&self) -> bool {
        match self.compute_hash() {
            Ok(expected) => expected == self.hash && hasher::meets_difficulty(&expected),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::miner;

    #[test]
    fn genesis_has_sentinel_fields() {
        let g = Block::genesis();
        assert!(g.is_genesis());
        assert_eq!(g.previous_hash, "0");
        assert_eq!(g.nonce, 0);
    }

    #[test]
    fn mined_block_has_valid_proof() {
        let data = BlockData {
            transactions: vec![Transaction::new(1.0, "a", "b")],
            index: 2,
        };
        let proof = miner::find_nonce("prev", &data).unwrap();
        let b = Block::new(
            data.index,
            data.transactions,
            proof.nonce,
            "prev".into(),
            proof.hash,
        );
        assert!(b.has_valid_proof());
    }

    #[test]
    fn invalid_when_mutated() {
        let data = BlockData {
            transactions: vec![Transaction::new(1.0, "a", "b")],
            index: 2,
        };
        let proof = miner::find_nonce("prev", &data).unwrap();
        let mut b = Block::new(
            data.index,
            data.transactions,
            proof.nonce,
            "prev".into(),
            proof.hash,
        );

        // tampering
        b.transactions.push(Transaction::new(100.0, "x", "y"));
        assert!(!b.has_valid_proof());
    }

    #[test]
    fn wire_format_uses_previous_block_hash() {
        let json = serde_json::to_value(Block::genesis()).unwrap();
        assert_eq!(json["previousBlockHash"], "0");
        assert!(json.get("previous_hash").is_none());
    }
}
