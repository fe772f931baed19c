use std::env;
use std::time::Duration;

use crate::network::normalize_url;
use crate::transaction::new_identifier;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PEER_TIMEOUT_SECS: u64 = 10;

/// Runtime settings read from the environment (and an optional `.env`).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// How peers reach this node.
    pub node_url: String,
    pub peer_timeout: Duration,
    pub bootstrap_peers: Vec<String>,
}

impl NodeConfig {
    /// `HOST`, `PORT`, `NODE_URL`, `PEER_TIMEOUT_SECS`, `BOOTSTRAP_PEERS`.
    /// A first CLI argument, if numeric, overrides `PORT`.
    pub fn from_env() -> Self {
        let port_arg = env::args().nth(1);
        Self::from_lookup(|key| env::var(key).ok(), port_arg.as_deref())
    }

    pub fn from_lookup<F>(lookup: F, port_arg: Option<&str>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port: u16 = port_arg
            .and_then(|v| v.parse().ok())
            .or_else(|| lookup("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_PORT);
        let node_url = lookup("NODE_URL")
            .map(|u| normalize_url(&u))
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        let peer_timeout = Duration::from_secs(
            lookup("PEER_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_PEER_TIMEOUT_SECS),
        );
        let bootstrap_peers = lookup("BOOTSTRAP_PEERS")
            .map(|v| {
                v.split(',')
                    .map(normalize_url)
                    .filter(|u| !u.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            node_url,
            peer_timeout,
            bootstrap_peers,
        }
    }
}

/// Who this node is for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct NodeIdentity {
    pub node_url: String,
    /// Recipient of this node's mining rewards.
    pub reward_address: String,
}

impl NodeIdentity {
    pub fn generate(node_url: &str) -> Self {
        Self {
            node_url: normalize_url(node_url),
            reward_address: new_identifier(),
        }
    }
}
