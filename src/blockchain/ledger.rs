use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hasher::BlockData;
use super::miner::Proof;
use super::Block;
use crate::error::{NodeError, Result};
use crate::transaction::Transaction;

/// Owned copy of the full ledger state, as exchanged between nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub chain: Vec<Block>,
    pub pending_transactions: Vec<Transaction>,
}

/// Inputs for a nonce search, captured once so the search runs unlocked.
#[derive(Debug, Clone)]
pub struct MiningTemplate {
    pub previous_hash: String,
    pub data: BlockData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionLookup {
    pub transaction: Transaction,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressHistory {
    pub address_transactions: Vec<Transaction>,
    pub address_balance: f64,
}

/// Why a peer-proposed block was turned away.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockRejection {
    #[error("previous hash {got} does not match tip {expected}")]
    PreviousHashMismatch { expected: String, got: String },
    #[error("index {got} does not follow tip index {tip}")]
    IndexMismatch { tip: u64, got: u64 },
    #[error("hash does not match content or lacks proof of work")]
    InvalidProof,
}

/// In-memory chain plus pending pool. All mutation goes through here.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Start from the genesis block and an empty pool.
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
        }
    }

    /// The chain is never empty, so there is always a tail.
    pub fn last_block(&self) -> &Block {
        &self.chain[self.chain.len() - 1]
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    #[cfg(test)]
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            chain: self.chain.clone(),
            pending_transactions: self.pending.clone(),
        }
    }

    /// Index of the block the next seal will produce.
    fn next_index(&self) -> u64 {
        self.last_block().index + 1
    }

    /// Create a transaction with a fresh id and queue it.
    pub fn submit_transaction(
        &mut self,
        amount: f64,
        sender: &str,
        recipient: &str,
    ) -> Transaction {
        let tx = Transaction::new(amount, sender, recipient);
        self.pending.push(tx.clone());
        debug!(
            "LEDGER - queued tx {} ({} -> {}, {}), pool size {}",
            tx.transaction_id,
            tx.sender,
            tx.recipient,
            tx.amount,
            self.pending.len()
        );
        tx
    }

    /// Queue a transaction built elsewhere (peer broadcast).
    /// Returns the index it is expected to be sealed into, or `None` if the
    /// id is already known.
    pub fn add_transaction(&mut self, tx: Transaction) -> Option<u64> {
        if self.knows_transaction(&tx.transaction_id) {
            debug!("LEDGER - ignoring duplicate tx {}", tx.transaction_id);
            return None;
        }
        self.pending.push(tx);
        Some(self.next_index())
    }

    fn knows_transaction(&self, id: &str) -> bool {
        self.pending.iter().any(|t| t.transaction_id == id)
            || self
                .chain
                .iter()
                .flat_map(|b| b.transactions.iter())
                .any(|t| t.transaction_id == id)
    }

    pub fn mining_template(&self) -> MiningTemplate {
        MiningTemplate {
            previous_hash: self.last_block().hash.clone(),
            data: BlockData {
                transactions: self.pending.clone(),
                index: self.next_index(),
            },
        }
    }

    /// Seal a locally mined proof over the transactions it was searched for.
    /// Those leave the pool; anything queued during the search stays pending.
    /// A proof whose tip moved since `template` was taken leaves state untouched.
    pub fn seal_mined(&mut self, template: &MiningTemplate, proof: Proof) -> Result<Block> {
        if self.last_block().hash != template.previous_hash
            || self.next_index() != template.data.index
        {
            warn!(
                "LEDGER - discarding stale proof for block #{}: tip moved",
                template.data.index
            );
            return Err(NodeError::StaleWork);
        }
        let searched = template.data.transactions.len();
        if !self.pending.starts_with(&template.data.transactions) {
            warn!(
                "LEDGER - discarding stale proof for block #{}: searched transactions left the pool",
                template.data.index
            );
            return Err(NodeError::StaleWork);
        }

        let arrived = self.pending.split_off(searched);
        let transactions = std::mem::replace(&mut self.pending, arrived);
        let block = Block::new(
            template.data.index,
            transactions,
            proof.nonce,
            template.previous_hash.clone(),
            proof.hash,
        );
        self.chain.push(block.clone());
        info!(
            "LEDGER - sealed block #{} (hash={}, nonce={}, txs={}), {} txs still pending",
            block.index,
            block.hash,
            block.nonce,
            block.transactions.len(),
            self.pending.len()
        );
        Ok(block)
    }

    /// Check a peer-proposed block against the current tip.
    pub fn check_candidate(&self, candidate: &Block) -> std::result::Result<(), BlockRejection> {
        let tip = self.last_block();
        if candidate.previous_hash != tip.hash {
            return Err(BlockRejection::PreviousHashMismatch {
                expected: tip.hash.clone(),
                got: candidate.previous_hash.clone(),
            });
        }
        if candidate.index != tip.index + 1 {
            return Err(BlockRejection::IndexMismatch {
                tip: tip.index,
                got: candidate.index,
            });
        }
        if !candidate.has_valid_proof() {
            return Err(BlockRejection::InvalidProof);
        }
        Ok(())
    }

    /// Append a peer's block if it extends the tip. On acceptance the whole
    /// pending pool is dropped, including transactions the block lacks.
    pub fn accept_block(&mut self, candidate: Block) -> bool {
        match self.check_candidate(&candidate) {
            Ok(()) => {
                info!(
                    "LEDGER - accepted peer block #{} (hash={}), dropping {} pending txs",
                    candidate.index,
                    candidate.hash,
                    self.pending.len()
                );
                self.chain.push(candidate);
                self.pending.clear();
                true
            }
            Err(reason) => {
                warn!(
                    "LEDGER - rejected peer block #{}: {}",
                    candidate.index, reason
                );
                false
            }
        }
    }

    /// Swap chain and pool together. Callers validate first.
    pub fn replace_chain(&mut self, chain: Vec<Block>, pending: Vec<Transaction>) {
        if chain.is_empty() {
            warn!("LEDGER - refusing to install an empty chain");
            return;
        }
        info!(
            "LEDGER - replacing chain: {} -> {} blocks, pool {} -> {}",
            self.chain.len(),
            chain.len(),
            self.pending.len(),
            pending.len()
        );
        self.chain = chain;
        self.pending = pending;
    }

    pub fn find_block_by_hash(&self, hash: &str) -> Option<Block> {
        self.chain.iter().find(|b| b.hash == hash).cloned()
    }

    /// Searches sealed blocks only.
    pub fn find_transaction_by_id(&self, id: &str) -> Option<TransactionLookup> {
        self.chain.iter().find_map(|block| {
            block
                .transactions
                .iter()
                .find(|t| t.transaction_id == id)
                .map(|t| TransactionLookup {
                    transaction: t.clone(),
                    block: block.clone(),
                })
        })
    }

    /// Sealed history of `address` and its balance (credits minus debits).
    pub fn find_by_address(&self, address: &str) -> AddressHistory {
        let address_transactions: Vec<Transaction> = self
            .chain
            .iter()
            .flat_map(|b| b.transactions.iter())
            .filter(|t| t.involves(address))
            .cloned()
            .collect();

        let mut address_balance = 0.0;
        for t in &address_transactions {
            if t.recipient == address {
                address_balance += t.amount;
            }
            if t.sender == address {
                address_balance -= t.amount;
            }
        }

        AddressHistory {
            address_transactions,
            address_balance,
        }
    }

    /// Synchronous mine of the current pool; the HTTP path splits these steps
    /// so the search runs without holding the lock.
    #[cfg(test)]
    pub fn mine_and_seal(&mut self) -> Result<Block> {
        let template = self.mining_template();
        let proof = super::miner::find_nonce(&template.previous_hash, &template.data)?;
        self.seal_mined(&template, proof)
    }
}

/// Build a block that extends `ledger`'s tip with `transactions`, as a peer would.
#[cfg(test)]
pub fn propose_next(ledger: &Ledger, transactions: Vec<Transaction>) -> Block {
    let previous_hash = ledger.last_block().hash.clone();
    let data = BlockData {
        transactions,
        index: ledger.last_block().index + 1,
    };
    let proof = super::miner::find_nonce(&previous_hash, &data).unwrap();
    assert!(super::hasher::meets_difficulty(&proof.hash));
    Block::new(data.index, data.transactions, proof.nonce, previous_hash, proof.hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::validator;

    #[test]
    fn starts_with_genesis_and_empty_pool() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.last_block().is_genesis());
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn submit_then_mine_seals_pool_in_order() {
        let mut ledger = Ledger::new();
        let genesis_hash = ledger.last_block().hash.clone();
        let t1 = ledger.submit_transaction(10.0, "alice", "bob");
        let t2 = ledger.submit_transaction(5.0, "bob", "carol");

        let block = ledger.mine_and_seal().unwrap();

        assert_eq!(ledger.len(), 2);
        assert!(ledger.pending().is_empty());
        assert_eq!(block.transactions, vec![t1, t2]);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(block.index, 2);
        assert_eq!(validator::check_chain(ledger.chain()), Ok(()));
    }

    #[test]
    fn stale_tip_is_discarded() {
        let mut ledger = Ledger::new();
        ledger.submit_transaction(1.0, "a", "b");
        let template = ledger.mining_template();
        let proof =
            crate::blockchain::miner::find_nonce(&template.previous_hash, &template.data).unwrap();

        // a peer block lands first
        let peer_block = propose_next(&ledger, vec![]);
        assert!(ledger.accept_block(peer_block));

        let len = ledger.len();
        assert!(matches!(
            ledger.seal_mined(&template, proof),
            Err(NodeError::StaleWork)
        ));
        assert_eq!(ledger.len(), len);
        assert_eq!(validator::check_chain(ledger.chain()), Ok(()));
    }

    #[test]
    fn arrivals_during_search_stay_pending() {
        let mut ledger = Ledger::new();
        let searched = ledger.submit_transaction(1.0, "a", "b");
        let template = ledger.mining_template();
        let proof =
            crate::blockchain::miner::find_nonce(&template.previous_hash, &template.data).unwrap();
        let late = ledger.submit_transaction(2.0, "c", "d");

        let block = ledger.seal_mined(&template, proof).unwrap();

        assert_eq!(block.transactions, vec![searched]);
        assert_eq!(ledger.pending(), &[late][..]);
        assert_eq!(validator::check_chain(ledger.chain()), Ok(()));

        // the late arrival goes into the next block
        let next = ledger.mine_and_seal().unwrap();
        assert_eq!(next.transactions.len(), 1);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn long_precision_amounts_survive_a_hop() {
        let mut ledger = Ledger::new();
        ledger.submit_transaction(0.1 / 7.0, "alice", "bob");
        ledger.mine_and_seal().unwrap();

        let wire = serde_json::to_string(&ledger.snapshot()).unwrap();
        let received: LedgerSnapshot = serde_json::from_str(&wire).unwrap();

        assert_eq!(received, ledger.snapshot());
        assert_eq!(validator::check_chain(&received.chain), Ok(()));
    }

    #[test]
    fn peer_block_with_long_precision_amount_is_accepted() {
        let inbound: Transaction = serde_json::from_str(
            r#"{"amount":98.36220254321534321,"sender":"a","recipient":"b","transactionId":"t1"}"#,
        )
        .unwrap();
        let mut proposer = Ledger::new();
        proposer.add_transaction(inbound);
        let block = proposer.mine_and_seal().unwrap();

        let wire = serde_json::to_string(&block).unwrap();
        let received: Block = serde_json::from_str(&wire).unwrap();

        let mut ledger = Ledger::new();
        assert_eq!(ledger.check_candidate(&received), Ok(()));
        assert!(ledger.accept_block(received));
    }

    #[test]
    fn accepts_linked_block_and_drops_pool() {
        let mut ledger = Ledger::new();
        ledger.submit_transaction(1.0, "a", "b");
        let candidate = propose_next(&ledger, vec![Transaction::new(3.0, "x", "y")]);

        assert!(ledger.accept_block(candidate.clone()));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.last_block(), &candidate);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn rejects_block_with_wrong_previous_hash() {
        let mut ledger = Ledger::new();
        ledger.submit_transaction(1.0, "a", "b");
        let mut candidate = propose_next(&ledger, vec![]);
        candidate.previous_hash = "not-the-tip".into();

        assert!(matches!(
            ledger.check_candidate(&candidate),
            Err(BlockRejection::PreviousHashMismatch { .. })
        ));
        assert!(!ledger.accept_block(candidate));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending().len(), 1);
    }

    #[test]
    fn rejects_block_with_wrong_index() {
        let mut ledger = Ledger::new();
        let mut candidate = propose_next(&ledger, vec![]);
        candidate.index = 5;
        assert!(matches!(
            ledger.check_candidate(&candidate),
            Err(BlockRejection::IndexMismatch { tip: 1, got: 5 })
        ));
        assert!(!ledger.accept_block(candidate));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn rejects_block_without_proof() {
        let mut ledger = Ledger::new();
        let candidate = Block::new(2, vec![], 0, "0".into(), "1234".into());
        assert_eq!(
            ledger.check_candidate(&candidate),
            Err(BlockRejection::InvalidProof)
        );
        assert!(!ledger.accept_block(candidate));
    }

    #[test]
    fn replace_chain_swaps_both_parts() {
        let mut other = Ledger::new();
        other.submit_transaction(1.0, "a", "b");
        other.mine_and_seal().unwrap();
        other.submit_transaction(2.0, "c", "d");
        let snap = other.snapshot();

        let mut ledger = Ledger::new();
        ledger.submit_transaction(9.0, "local", "only");
        ledger.replace_chain(snap.chain.clone(), snap.pending_transactions.clone());
        assert_eq!(ledger.snapshot(), snap);
    }

    #[test]
    fn duplicate_inbound_transactions_are_ignored() {
        let mut ledger = Ledger::new();
        let tx = Transaction::new(1.0, "a", "b");
        assert_eq!(ledger.add_transaction(tx.clone()), Some(2));
        assert_eq!(ledger.add_transaction(tx.clone()), None);
        ledger.mine_and_seal().unwrap();
        assert_eq!(ledger.add_transaction(tx), None);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn lookups_search_sealed_blocks() {
        let mut ledger = Ledger::new();
        let sealed = ledger.submit_transaction(10.0, "alice", "bob");
        let block = ledger.mine_and_seal().unwrap();
        let pending = ledger.submit_transaction(4.0, "bob", "carol");

        assert_eq!(ledger.find_block_by_hash(&block.hash), Some(block.clone()));
        assert_eq!(ledger.find_block_by_hash("nope"), None);

        let found = ledger.find_transaction_by_id(&sealed.transaction_id).unwrap();
        assert_eq!(found.transaction, sealed);
        assert_eq!(found.block, block);
        assert!(ledger.find_transaction_by_id(&pending.transaction_id).is_none());
    }

    #[test]
    fn address_balance_is_credits_minus_debits() {
        let mut ledger = Ledger::new();
        ledger.submit_transaction(10.0, "alice", "bob");
        ledger.submit_transaction(3.0, "bob", "carol");
        ledger.submit_transaction(2.0, "bob", "bob");
        ledger.submit_transaction(7.0, "dave", "erin");
        ledger.mine_and_seal().unwrap();

        let history = ledger.find_by_address("bob");
        assert_eq!(history.address_transactions.len(), 3);
        assert_eq!(history.address_balance, 7.0);

        let empty = ledger.find_by_address("nobody");
        assert!(empty.address_transactions.is_empty());
        assert_eq!(empty.address_balance, 0.0);
    }
}
