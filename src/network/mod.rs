pub mod broadcast;
pub mod client;
pub mod peers;

pub use broadcast::PeerOutcome;
pub use client::PeerClient;
pub use peers::{PeerRegistry, normalize_url};
