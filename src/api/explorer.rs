use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AddressResponse, AppState, BlockLookupResponse, TransactionLookupResponse};

#[get("/block/{hash}")]
pub async fn get_block(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let hash = path.into_inner().0;
    let block = state
        .ledger
        .read()
        .expect("ledger lock poisoned")
        .find_block_by_hash(&hash);
    HttpResponse::Ok().json(BlockLookupResponse { block })
}

/// Sealed transactions only; a pending one reads as not found.
#[get("/transaction/{id}")]
pub async fn get_transaction(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let id = path.into_inner().0;
    let found = state
        .ledger
        .read()
        .expect("ledger lock poisoned")
        .find_transaction_by_id(&id);
    let resp = match found {
        Some(lookup) => TransactionLookupResponse {
            transaction: Some(lookup.transaction),
            block: Some(lookup.block),
        },
        None => TransactionLookupResponse {
            transaction: None,
            block: None,
        },
    };
    HttpResponse::Ok().json(resp)
}

#[get("/address/{address}")]
pub async fn get_address(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let address = path.into_inner().0;
    let address_data = state
        .ledger
        .read()
        .expect("ledger lock poisoned")
        .find_by_address(&address);
    HttpResponse::Ok().json(AddressResponse { address_data })
}
