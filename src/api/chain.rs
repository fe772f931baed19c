use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::{AppState, BlockchainResponse, ConsensusResponse, ReceiveBlockResponse};
use crate::blockchain::Block;
use crate::consensus;

/// Full ledger snapshot (chain + pending pool) plus this node's view of the network.
#[get("/blockchain")]
pub async fn get_blockchain(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.ledger.read().expect("ledger lock poisoned").snapshot();
    HttpResponse::Ok().json(BlockchainResponse {
        snapshot,
        current_node_url: state.identity.node_url.clone(),
        network_nodes: state.peer_list(),
    })
}

/// A peer proposes the next block. Rejection is a normal answer, not an error.
#[post("/receive-new-block")]
pub async fn receive_new_block(
    state: web::Data<AppState>,
    body: web::Json<Block>,
) -> impl Responder {
    let block = body.into_inner();
    let accepted = state
        .ledger
        .write()
        .expect("ledger lock poisoned")
        .accept_block(block.clone());

    let note = if accepted {
        state.mining.cancel_all();
        info!("RECEIVE - accepted block #{} from a peer", block.index);
        "New block received and accepted."
    } else {
        "New block rejected."
    };

    HttpResponse::Ok().json(ReceiveBlockResponse {
        note: note.to_string(),
        accepted,
        new_block: block,
    })
}

/// Pull every peer's ledger and adopt the longest valid chain.
#[get("/consensus")]
pub async fn run_consensus(state: web::Data<AppState>) -> impl Responder {
    let peers = state.peer_list();
    let outcome = consensus::reconcile(&state.ledger, &peers, &state.client).await;

    if outcome.replaced {
        state.mining.cancel_all();
    }

    let note = if outcome.replaced {
        "This chain has been replaced."
    } else {
        "Current chain has not been replaced."
    };
    let chain = state
        .ledger
        .read()
        .expect("ledger lock poisoned")
        .chain()
        .to_vec();

    HttpResponse::Ok().json(ConsensusResponse {
        note: note.to_string(),
        replaced: outcome.replaced,
        chain,
        failed_peers: outcome.failed_peers,
    })
}
