mod chain;
mod explorer;
mod health;
mod mining;
pub mod models;
mod network;
mod tx;

use actix_web::web::ServiceConfig;

pub use models::AppState;

/// Routes sit at the root: peers address each other as `{node_url}{path}`.
pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health_check)
        .service(chain::get_blockchain)
        .service(chain::receive_new_block)
        .service(chain::run_consensus)
        .service(tx::broadcast_transaction)
        .service(tx::post_transaction)
        .service(mining::mine_block)
        .service(network::register_and_broadcast_node)
        .service(network::register_node)
        .service(network::register_nodes_bulk)
        .service(explorer::get_block)
        .service(explorer::get_transaction)
        .service(explorer::get_address);
}
