use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::cart::{CartItem, NewCartItem};

/// `GET /api/cart`
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<CartItem>> {
    Json(state.cart.list())
}

/// `POST /api/cart`: append a configured line item; returns the new list.
pub async fn add(
    State(state): State<Arc<AppState>>,
    Json(item): Json<NewCartItem>,
) -> Json<Vec<CartItem>> {
    Json(state.cart.add(item))
}

/// `DELETE /api/cart/{id}`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Json<Vec<CartItem>> {
    Json(state.cart.remove(id))
}

#[derive(Debug, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// `POST /api/cart/{id}/quantity`
pub async fn update_quantity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<QuantityUpdate>,
) -> Json<Vec<CartItem>> {
    Json(state.cart.update_quantity(id, update.quantity))
}

/// `DELETE /api/cart`
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<Vec<CartItem>> {
    state.cart.clear();
    Json(Vec::new())
}
