//! Longest-valid-chain reconciliation.
//!
//! Pulls every peer's ledger, picks the strictly longest chain (first peer wins
//! among equals, the incumbent wins ties with peers), validates it, and only
//! then swaps it in together with that peer's pending pool.

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::RwLock;

use crate::blockchain::{Ledger, LedgerSnapshot, validator};
use crate::error::Result;
use crate::network::broadcast;

/// Where peer ledgers come from.
pub trait PeerSource {
    async fn fetch_snapshot(&self, peer: &str) -> Result<LedgerSnapshot>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub replaced: bool,
    /// Peer whose chain was adopted.
    pub source: Option<String>,
    pub chain_length: usize,
    pub failed_peers: Vec<String>,
}

/// Pick the first candidate strictly longer than `local_len` and than every other candidate.
pub fn select_longest(
    local_len: usize,
    candidates: Vec<(String, LedgerSnapshot)>,
) -> Option<(String, LedgerSnapshot)> {
    let mut best: Option<(String, LedgerSnapshot)> = None;
    let mut best_len = local_len;
    for (peer, snapshot) in candidates {
        if snapshot.chain.len() > best_len {
            best_len = snapshot.chain.len();
            best = Some((peer, snapshot));
        }
    }
    best
}

pub async fn reconcile<S: PeerSource>(
    ledger: &RwLock<Ledger>,
    peers: &[String],
    source: &S,
) -> Reconciliation {
    let local_len = ledger.read().expect("ledger lock poisoned").len();
    let results = broadcast::fan_out(peers, |peer| async move {
        source.fetch_snapshot(&peer).await
    })
    .await;

    let mut failed_peers = Vec::new();
    let mut candidates = Vec::new();
    for (peer, result) in results {
        match result {
            Ok(snapshot) => candidates.push((peer, snapshot)),
            Err(_) => failed_peers.push(peer),
        }
    }

    debug!(
        "CONSENSUS - local length {}, {} candidates, {} failed peers",
        local_len,
        candidates.len(),
        failed_peers.len()
    );

    let current_len = || ledger.read().expect("ledger lock poisoned").len();
    let retained = |chain_length: usize, failed_peers: Vec<String>| Reconciliation {
        replaced: false,
        source: None,
        chain_length,
        failed_peers,
    };

    let Some((peer, snapshot)) = select_longest(local_len, candidates) else {
        info!("CONSENSUS - local chain retained (no longer chain found)");
        return retained(current_len(), failed_peers);
    };

    if let Err(fault) = validator::check_chain(&snapshot.chain) {
        warn!(
            "CONSENSUS - longest chain from {} ({} blocks) is invalid: {}",
            peer,
            snapshot.chain.len(),
            fault
        );
        return retained(current_len(), failed_peers);
    }

    let mut ledger = ledger.write().expect("ledger lock poisoned");
    // The local chain may have grown while peers were being fetched or validated.
    if snapshot.chain.len() <= ledger.len() {
        info!(
            "CONSENSUS - local chain grew to {} blocks meanwhile; retained",
            ledger.len()
        );
        return retained(ledger.len(), failed_peers);
    }

    let chain_length = snapshot.chain.len();
    ledger.replace_chain(snapshot.chain, snapshot.pending_transactions);
    info!(
        "CONSENSUS - adopted chain of {} blocks from {}",
        chain_length, peer
    );
    Reconciliation {
        replaced: true,
        source: Some(peer),
        chain_length,
        failed_peers,
    }
}
