pub mod block;
pub mod hasher;
pub mod ledger;
pub mod miner;
pub mod validator;

pub use block::Block;
pub use ledger::{AddressHistory, Ledger, LedgerSnapshot};
pub use miner::MiningJobs;

/// Proof-of-Work difficulty (leading zero hex chars). Fixed network-wide.
pub const DIFFICULTY: usize = 4;

/// Amount credited to the miner's reward address per sealed block.
pub const MINING_REWARD: f64 = 12.5;

/// Previous-hash and hash sentinel of the genesis block.
pub const GENESIS_HASH: &str = "0";
