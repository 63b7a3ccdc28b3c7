//! Fleet Simulation - Axum Server

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleet_simulation::api::{create_router, AppState};
use fleet_simulation::config::ServerConfig;
use fleet_simulation::console;
use fleet_simulation::demo_data;
use fleet_simulation::store::InMemoryFleetStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fleet_simulation=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    console::print_banner();

    let store = match config.demo_data {
        Some(demo) => {
            info!(dataset = demo.as_str(), "Loading demo fleet");
            InMemoryFleetStore::with_fleet(demo_data::generate(demo))?
        }
        None => InMemoryFleetStore::new(),
    };
    let state = Arc::new(AppState::with_store(Arc::new(store), config.policy.clone()));
    let app = create_router(state);

    let addr = config.socket_addr();
    println!("Server listening on http://{}", addr);
    println!("Swagger UI at http://{}/q/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
