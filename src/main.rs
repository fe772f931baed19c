mod api;
mod blockchain;
mod config;
mod consensus;
mod error;
mod network;
mod transaction;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info};

use api::AppState;
use config::NodeConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let state = match AppState::new(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            error!("failed to initialise node: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    info!(
        "⛓️ Starting ledger node at {} (reward address {}, {} bootstrap peers)",
        state.identity.node_url,
        state.identity.reward_address,
        state.peer_list().len()
    );

    let host = config.host.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), config.port))?
    .run()
    .await
}
