use actix_web::{HttpResponse, get, web};
use log::{debug, info};

use super::models::{AppState, MineResponse};
use crate::blockchain::{MINING_REWARD, miner};
use crate::error::NodeError;
use crate::transaction::{REWARD_SENDER, Transaction};

/// Mine the current pending pool:
/// - Snapshot tip hash + pool under a read lock
/// - Search for a nonce on the blocking pool (cancellable by tip changes)
/// - Re-check the tip, then seal the searched transactions under the write lock
/// - Push the block to every peer
/// - Issue and broadcast the reward transaction for the next block
#[get("/mine")]
pub async fn mine_block(state: web::Data<AppState>) -> Result<HttpResponse, NodeError> {
    let template = state
        .ledger
        .read()
        .expect("ledger lock poisoned")
        .mining_template();
    debug!(
        "MINER - searching block #{} over {} pending txs (prev={})",
        template.data.index,
        template.data.transactions.len(),
        template.previous_hash
    );

    let token = state.mining.start();
    let search = {
        let template = template.clone();
        web::block(move || {
            miner::find_nonce_cancellable(&template.previous_hash, &template.data, &token)
        })
        .await
    };
    let proof = search.map_err(|e| NodeError::Internal(format!("mining task failed: {}", e)))??;

    // Exclusive access only for the seal itself.
    let block = state
        .ledger
        .write()
        .expect("ledger lock poisoned")
        .seal_mined(&template, proof)?;

    let peers = state.peer_list();
    let block_broadcast = state
        .client
        .broadcast(&peers, "/receive-new-block", &block)
        .await;

    let reward = Transaction::new(
        MINING_REWARD,
        REWARD_SENDER,
        state.identity.reward_address.clone(),
    );
    state
        .ledger
        .write()
        .expect("ledger lock poisoned")
        .add_transaction(reward.clone());
    let reward_broadcast = state.client.broadcast(&peers, "/transaction", &reward).await;

    info!(
        "MINER - block #{} sealed (hash={}, nonce={}); delivered to {}/{} peers",
        block.index,
        block.hash,
        block.nonce,
        block_broadcast.iter().filter(|o| o.ok).count(),
        block_broadcast.len()
    );

    Ok(HttpResponse::Ok().json(MineResponse {
        note: "New block mined & broadcast successfully".to_string(),
        block,
        block_broadcast,
        reward_transaction: reward,
        reward_broadcast,
    }))
}
