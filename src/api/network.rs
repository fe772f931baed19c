use actix_web::{HttpResponse, post, web};
use log::info;

use super::models::{
    AppState, RegisterAndBroadcastResponse, RegisterBulkRequest, RegisterBulkResponse,
    RegisterNodeRequest, RegisterNodeResponse,
};
use crate::error::NodeError;
use crate::network::normalize_url;

/// Join handshake driven by the node a newcomer contacts:
/// 1. register the newcomer locally
/// 2. announce it to every already-known peer (`/register-node`)
/// 3. push the full peer list (plus self) back to the newcomer (`/register-nodes-bulk`)
///
/// Announce failures are reported per peer. The bulk push is the one delivery
/// that must succeed.
#[post("/register-and-broadcast-node")]
pub async fn register_and_broadcast_node(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodeRequest>,
) -> Result<HttpResponse, NodeError> {
    let new_node_url = normalize_url(&body.new_node_url);
    if new_node_url.is_empty() {
        return Err(NodeError::BadRequest("newNodeUrl required".into()));
    }
    if new_node_url == state.identity.node_url {
        return Err(NodeError::BadRequest("cannot register this node with itself".into()));
    }

    let (registered, existing) = {
        let mut peers = state.peers.write().expect("peers lock poisoned");
        let registered = peers.register(&new_node_url);
        let existing: Vec<String> = peers
            .list()
            .into_iter()
            .filter(|p| *p != new_node_url)
            .collect();
        (registered, existing)
    };

    let announced = state
        .client
        .broadcast(
            &existing,
            "/register-node",
            &RegisterNodeRequest {
                new_node_url: new_node_url.clone(),
            },
        )
        .await;

    let mut all_network_nodes = existing;
    all_network_nodes.push(state.identity.node_url.clone());
    state
        .client
        .post_json(
            &new_node_url,
            "/register-nodes-bulk",
            &RegisterBulkRequest { all_network_nodes },
        )
        .await?;

    info!(
        "JOIN - {} joined; announced to {}/{} peers",
        new_node_url,
        announced.iter().filter(|o| o.ok).count(),
        announced.len()
    );

    Ok(HttpResponse::Ok().json(RegisterAndBroadcastResponse {
        note: "New node registered with network successfully.".to_string(),
        registered,
        announced,
    }))
}

/// Inbound announce from another node.
#[post("/register-node")]
pub async fn register_node(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodeRequest>,
) -> Result<HttpResponse, NodeError> {
    if body.new_node_url.trim().is_empty() {
        return Err(NodeError::BadRequest("newNodeUrl required".into()));
    }
    let registered = state
        .peers
        .write()
        .expect("peers lock poisoned")
        .register(&body.new_node_url);

    let note = if registered {
        "New node registered successfully."
    } else {
        "Node already known or is this node; ignored."
    };
    Ok(HttpResponse::Ok().json(RegisterNodeResponse {
        note: note.to_string(),
        registered,
    }))
}

/// Inbound bulk sync pushed by the node we joined through.
#[post("/register-nodes-bulk")]
pub async fn register_nodes_bulk(
    state: web::Data<AppState>,
    body: web::Json<RegisterBulkRequest>,
) -> HttpResponse {
    let (added, network_nodes) = {
        let mut peers = state.peers.write().expect("peers lock poisoned");
        let added = peers.register_bulk(&body.all_network_nodes);
        (added, peers.list())
    };
    info!("PEERS - bulk registration added {} peers", added);

    HttpResponse::Ok().json(RegisterBulkResponse {
        note: "Bulk registration successful.".to_string(),
        added,
        network_nodes,
    })
}
