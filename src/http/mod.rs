use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::cart::CartStore;
use crate::commerce::CommerceStore;
use crate::config::ServerConfig;
use crate::constraints::CustomizationLimits;
use crate::engine::llm::ChatBackend;
use crate::inventory::Inventory;

mod cart;
mod catalog_search;
mod chat;
mod commerce;
mod designs;
mod discover;
mod sse;
mod well_known;

/// Shared application state, built once at startup and injected into every
/// handler. The stores live here rather than in globals so tests can spin
/// up isolated instances.
pub struct AppState {
    pub backend: Arc<dyn ChatBackend>,
    pub inventory: Inventory,
    pub commerce: CommerceStore,
    pub cart: CartStore,
    pub limits: CustomizationLimits,
    pub config: ServerConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat::handle))
        .route("/api/designs", post(designs::handle))
        .route("/api/discover", post(discover::handle))
        .route("/api/offer", post(commerce::create_offer))
        .route("/api/commit", post(commerce::commit_offer))
        .route("/api/order/{id}", get(commerce::get_order))
        .route("/api/catalog/search", get(catalog_search::handle))
        .route("/api/cart", get(cart::list).post(cart::add).delete(cart::clear))
        .route("/api/cart/{id}", delete(cart::remove))
        .route("/api/cart/{id}/quantity", post(cart::update_quantity))
        .route(
            "/.well-known/ucp-capabilities.json",
            get(well_known::capabilities),
        )
        .route(
            "/.well-known/ucp-capabilities.jsonld",
            get(well_known::capabilities_jsonld),
        )
        .route("/.well-known/ucp-products.json", get(well_known::products))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok", "service": "merchforge" }))
}
