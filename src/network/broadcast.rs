use futures::future::join_all;
use log::warn;
use serde::Serialize;
use std::future::Future;

use crate::error::Result;

/// Per-peer result of a fan-out call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerOutcome {
    pub peer: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Issue `call` to every peer concurrently and wait for all of them.
/// One peer failing never cancels the others; failures are logged and returned.
pub async fn fan_out<T, F, Fut>(peers: &[String], call: F) -> Vec<(String, Result<T>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let calls = peers.iter().map(|peer| {
        let fut = call(peer.clone());
        let peer = peer.clone();
        async move { (peer, fut.await) }
    });

    let results = join_all(calls).await;
    for (peer, result) in &results {
        if let Err(e) = result {
            warn!("FANOUT - peer {} failed: {}", peer, e);
        }
    }
    results
}

pub fn summarize<T>(results: &[(String, Result<T>)]) -> Vec<PeerOutcome> {
    results
        .iter()
        .map(|(peer, result)| PeerOutcome {
            peer: peer.clone(),
            ok: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
        })
        .collect()
}
