use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::blockchain::{AddressHistory, Block, Ledger, LedgerSnapshot, MiningJobs};
use crate::config::{NodeConfig, NodeIdentity};
use crate::error::{NodeError, Result};
use crate::network::{PeerClient, PeerOutcome, PeerRegistry};
use crate::transaction::Transaction;

/// Shared node state: ledger and peers behind their own locks.
pub struct AppState {
    pub ledger: RwLock<Ledger>,
    pub peers: RwLock<PeerRegistry>,
    pub mining: MiningJobs,
    pub client: PeerClient,
    pub identity: NodeIdentity,
}

impl AppState {
    pub fn new(config: &NodeConfig) -> Result<Self> {
        let identity = NodeIdentity::generate(&config.node_url);
        let mut peers = PeerRegistry::new(&identity.node_url);
        peers.register_bulk(&config.bootstrap_peers);
        Ok(Self {
            ledger: RwLock::new(Ledger::new()),
            peers: RwLock::new(peers),
            mining: MiningJobs::new(),
            client: PeerClient::new(config.peer_timeout)?,
            identity,
        })
    }

    pub fn peer_list(&self) -> Vec<String> {
        self.peers.read().expect("peers lock poisoned").list()
    }
}

/* ---------- Ledger API Models ---------- */

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainResponse {
    #[serde(flatten)]
    pub snapshot: LedgerSnapshot,
    pub current_node_url: String,
    pub network_nodes: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveBlockResponse {
    pub note: String,
    pub accepted: bool,
    pub new_block: Block,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResponse {
    pub note: String,
    pub replaced: bool,
    pub chain: Vec<Block>,
    pub failed_peers: Vec<String>,
}

/* ---------- TX API Models ---------- */

#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    pub amount: f64,
    pub sender: String,
    pub recipient: String,
}

impl NewTransactionRequest {
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(NodeError::BadRequest(
                "amount must be a non-negative number".into(),
            ));
        }
        if self.sender.trim().is_empty() || self.recipient.trim().is_empty() {
            return Err(NodeError::BadRequest(
                "sender and recipient are required".into(),
            ));
        }
        Ok(())
    }
}

/// `/transaction` takes either a fully built transaction (peer broadcast)
/// or the fields of a new one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TransactionRequest {
    Prebuilt(Transaction),
    New(NewTransactionRequest),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub note: String,
    pub transaction: Transaction,
    pub block_index: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTransactionResponse {
    pub note: String,
    pub transaction: Transaction,
    pub peers: Vec<PeerOutcome>,
}

/* ---------- Mining API Models ---------- */

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MineResponse {
    pub note: String,
    pub block: Block,
    pub block_broadcast: Vec<PeerOutcome>,
    pub reward_transaction: Transaction,
    pub reward_broadcast: Vec<PeerOutcome>,
}

/* ---------- Network API Models ---------- */

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeRequest {
    pub new_node_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBulkRequest {
    pub all_network_nodes: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeResponse {
    pub note: String,
    pub registered: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBulkResponse {
    pub note: String,
    pub added: usize,
    pub network_nodes: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAndBroadcastResponse {
    pub note: String,
    pub registered: bool,
    pub announced: Vec<PeerOutcome>,
}

/* ---------- Explorer API Models ---------- */

#[derive(Serialize)]
pub struct BlockLookupResponse {
    pub block: Option<Block>,
}

#[derive(Serialize)]
pub struct TransactionLookupResponse {
    pub transaction: Option<Transaction>,
    pub block: Option<Block>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub address_data: AddressHistory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_request_distinguishes_prebuilt() {
        let prebuilt: TransactionRequest = serde_json::from_str(
            r#"{"amount":1.5,"sender":"a","recipient":"b","transactionId":"id1"}"#,
        )
        .unwrap();
        assert!(matches!(prebuilt, TransactionRequest::Prebuilt(ref t) if t.transaction_id == "id1"));

        let new: TransactionRequest =
            serde_json::from_str(r#"{"amount":1.5,"sender":"a","recipient":"b"}"#).unwrap();
        assert!(matches!(new, TransactionRequest::New(_)));

        assert!(serde_json::from_str::<TransactionRequest>(r#"{"amount":1.5}"#).is_err());
    }

    #[test]
    fn new_transaction_validation() {
        let ok = NewTransactionRequest {
            amount: 0.0,
            sender: "a".into(),
            recipient: "b".into(),
        };
        assert!(ok.validate().is_ok());

        let negative = NewTransactionRequest { amount: -1.0, ..ok };
        assert!(matches!(negative.validate(), Err(NodeError::BadRequest(_))));

        let blank = NewTransactionRequest {
            amount: 1.0,
            sender: " ".into(),
            recipient: "b".into(),
        };
        assert!(blank.validate().is_err());
    }
}
