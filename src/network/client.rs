use log::debug;
use serde::Serialize;
use std::time::Duration;

use super::broadcast::{self, PeerOutcome};
use crate::blockchain::LedgerSnapshot;
use crate::consensus::PeerSource;
use crate::error::{NodeError, Result};

/// Outbound HTTP calls to other nodes. Every call is bounded by the client timeout;
/// a timeout counts as a failure for that peer.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Internal(format!("HTTP client error: {}", e)))?;
        Ok(Self { http })
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        peer: &str,
        path: &str,
        body: &B,
    ) -> Result<()> {
        let url = format!("{}{}", peer, path);
        debug!("PEER - POST {}", url);
        self.http
            .post(&url)
            .json(body)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| NodeError::peer(peer, e))?;
        Ok(())
    }

    pub async fn get_snapshot(&self, peer: &str) -> Result<LedgerSnapshot> {
        let url = format!("{}/blockchain", peer);
        debug!("PEER - GET {}", url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| NodeError::peer(peer, e))?;
        resp.json::<LedgerSnapshot>()
            .await
            .map_err(|e| NodeError::peer(peer, format!("bad ledger payload: {}", e)))
    }

    /// POST `body` to `path` on every peer concurrently.
    pub async fn broadcast<B: Serialize + ?Sized>(
        &self,
        peers: &[String],
        path: &str,
        body: &B,
    ) -> Vec<PeerOutcome> {
        let results = broadcast::fan_out(peers, |peer| async move {
            self.post_json(&peer, path, body).await
        })
        .await;
        broadcast::summarize(&results)
    }
}

impl PeerSource for PeerClient {
    async fn fetch_snapshot(&self, peer: &str) -> Result<LedgerSnapshot> {
        self.get_snapshot(peer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn unreachable_peer_is_reported_not_fatal() {
        let client = PeerClient::new(Duration::from_millis(500)).unwrap();
        // Port 9 (discard) on localhost is expected to refuse connections.
        let outcomes = client
            .broadcast(&["http://127.0.0.1:9".to_string()], "/register-node", &"x")
            .await;
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].ok);

        let err = client.get_snapshot("http://127.0.0.1:9").await.unwrap_err();
        assert!(matches!(err, NodeError::Peer { .. }));
    }
}
