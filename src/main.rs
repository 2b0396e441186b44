use std::sync::Arc;

use merchforge::cart::CartStore;
use merchforge::commerce::CommerceStore;
use merchforge::config::{LlmConfig, ServerConfig};
use merchforge::constraints::CustomizationLimits;
use merchforge::engine::llm::HttpLlmClient;
use merchforge::error::AppError;
use merchforge::http::{router, AppState};
use merchforge::inventory::Inventory;
use merchforge::{logging, ucp};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // .env is optional; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    logging::init();

    tracing::info!("Starting merchforge v{}", env!("CARGO_PKG_VERSION"));

    let llm_config = LlmConfig::from_env();
    tracing::info!(provider = ?llm_config.provider, model = %llm_config.model, "LLM backend configured");

    let inventory = Inventory::load_embedded()?;
    tracing::info!("Inventory loaded ({} items)", inventory.items().len());

    // Fail fast on a broken capability document instead of 500ing later.
    ucp::load_capabilities()?;

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState {
        backend: Arc::new(HttpLlmClient::new(llm_config)?),
        inventory,
        commerce: CommerceStore::new(),
        cart: CartStore::new(),
        limits: CustomizationLimits::default(),
        config: config.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("Listening on http://{}", config.bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
