use log::debug;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::hasher::{self, BlockData, PreparedData};
use crate::error::{NodeError, Result};

/// How many nonces are tried between cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// A nonce together with the digest it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Proof {
    pub nonce: u64,
    pub hash: String,
}

/// Run a search that cannot be cancelled.
#[cfg(test)]
pub fn find_nonce(previous_hash: &str, data: &BlockData) -> Result<Proof> {
    find_nonce_cancellable(previous_hash, data, &CancellationToken::new())
}

/// Starting at 0, return the first nonce whose digest meets the difficulty.
pub fn find_nonce_cancellable(
    previous_hash: &str,
    data: &BlockData,
    token: &CancellationToken,
) -> Result<Proof> {
    let prepared = PreparedData::new(previous_hash, data)?;
    let mut nonce: u64 = 0;
    loop {
        let hash = prepared.digest(nonce);
        if hasher::meets_difficulty(&hash) {
            debug!("MINER - found nonce {} for block #{}", nonce, data.index);
            return Ok(Proof { nonce, hash });
        }
        nonce = nonce
            .checked_add(1)
            .ok_or_else(|| NodeError::Internal("nonce space exhausted".into()))?;
        if nonce % CANCEL_CHECK_INTERVAL == 0 && token.is_cancelled() {
            debug!(
                "MINER - search for block #{} cancelled at nonce {}",
                data.index, nonce
            );
            return Err(NodeError::MiningCancelled);
        }
    }
}

/// Every in-flight search holds a child of the current root token. Moving the
/// tip cancels the root and installs a fresh one for later searches.
#[derive(Debug, Default)]
pub struct MiningJobs {
    root: Mutex<CancellationToken>,
}

impl MiningJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> CancellationToken {
        self.root.lock().expect("mutex poisoned").child_token()
    }

    /// Abandon every search started so far.
    pub fn cancel_all(&self) {
        let mut root = self.root.lock().expect("mutex poisoned");
        root.cancel();
        *root = CancellationToken::new();
        debug!("MINER - in-flight searches cancelled");
    }
}
