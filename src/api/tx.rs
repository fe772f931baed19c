use actix_web::{HttpResponse, post, web};
use log::{debug, info};
use std::time::Instant;

use super::models::{
    AppState, BroadcastTransactionResponse, NewTransactionRequest, TransactionRequest,
    TransactionResponse,
};
use crate::error::NodeError;

/// Queue a transaction locally, without broadcasting. Accepts either a peer's
/// pre-built transaction or the fields of a new one.
#[post("/transaction")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<TransactionRequest>,
) -> Result<HttpResponse, NodeError> {
    let request = body.into_inner();
    if let TransactionRequest::New(req) = &request {
        req.validate()?;
    }

    let (transaction, block_index) = {
        let mut ledger = state.ledger.write().expect("ledger lock poisoned");
        match request {
            TransactionRequest::Prebuilt(tx) => {
                let index = ledger.add_transaction(tx.clone());
                (tx, index)
            }
            TransactionRequest::New(req) => {
                let tx = ledger.submit_transaction(req.amount, &req.sender, &req.recipient);
                (tx, Some(ledger.last_block().index + 1))
            }
        }
    };

    let note = match block_index {
        Some(index) => format!("Transaction will be added in block {}.", index),
        None => "Transaction already known; ignored.".to_string(),
    };
    debug!("POST /transaction - {} ({})", transaction.transaction_id, note);

    Ok(HttpResponse::Ok().json(TransactionResponse {
        note,
        transaction,
        block_index,
    }))
}

/// Create a transaction, queue it, and push it to every peer's `/transaction`.
#[post("/transaction/broadcast")]
pub async fn broadcast_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTransactionRequest>,
) -> Result<HttpResponse, NodeError> {
    let t0 = Instant::now();
    body.validate()?;

    let transaction = state
        .ledger
        .write()
        .expect("ledger lock poisoned")
        .submit_transaction(body.amount, &body.sender, &body.recipient);

    let peers = state.peer_list();
    let outcomes = state
        .client
        .broadcast(&peers, "/transaction", &transaction)
        .await;

    info!(
        "POST /transaction/broadcast - tx={} delivered to {}/{} peers ({} ms)",
        transaction.transaction_id,
        outcomes.iter().filter(|o| o.ok).count(),
        outcomes.len(),
        t0.elapsed().as_millis()
    );

    Ok(HttpResponse::Ok().json(BroadcastTransactionResponse {
        note: "Transaction created and broadcast successfully.".to_string(),
        transaction,
        peers: outcomes,
    }))
}
