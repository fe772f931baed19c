use thiserror::Error;

use super::Block;
use super::hasher;

/// First defect found while walking a chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainFault {
    #[error("chain is empty")]
    Empty,
    #[error("first block is not the genesis block")]
    BadGenesis,
    #[error("block at position {0} does not link to its predecessor")]
    BrokenLink(usize),
    #[error("block at position {0} has index {1}, expected {2}")]
    BadIndex(usize, u64, u64),
    #[error("block at position {0} stores a hash that does not match its content")]
    HashMismatch(usize),
    #[error("block at position {0} does not satisfy the proof-of-work prefix")]
    InsufficientWork(usize),
}

/// Walk `chain` and report the first defect. A chain is valid only if every
/// block passes.
pub fn check_chain(chain: &[Block]) -> Result<(), ChainFault> {
    let genesis = chain.first().ok_or(ChainFault::Empty)?;
    if !genesis.is_genesis() {
        return Err(ChainFault::BadGenesis);
    }

    for (pos, pair) in chain.windows(2).enumerate() {
        let (prev, current) = (&pair[0], &pair[1]);
        let pos = pos + 1;

        if current.previous_hash != prev.hash {
            return Err(ChainFault::BrokenLink(pos));
        }

        let expected_index = prev.index + 1;
        if current.index != expected_index {
            return Err(ChainFault::BadIndex(pos, current.index, expected_index));
        }

        let recomputed = current
            .compute_hash()
            .map_err(|_| ChainFault::HashMismatch(pos))?;
        if !hasher::meets_difficulty(&recomputed) {
            return Err(ChainFault::InsufficientWork(pos));
        }
        if recomputed != current.hash {
            return Err(ChainFault::HashMismatch(pos));
        }
    }

    Ok(())
}
