use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::commerce::{Offer, OfferRequest, Order};
use crate::error::AppError;

/// `POST /api/offer`: price an item and hold it as an open offer.
pub async fn create_offer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OfferRequest>,
) -> Result<Json<Offer>, AppError> {
    if request.item_id.is_empty() {
        return Err(AppError::Validation("Missing item_id".into()));
    }
    state
        .commerce
        .create_offer(&state.inventory, &request)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Item not found".into()))
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    #[serde(default)]
    pub offer_id: String,
}

/// `POST /api/commit`: turn an open offer into a confirmed order.
pub async fn commit_offer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommitRequest>,
) -> Result<Json<Order>, AppError> {
    if request.offer_id.is_empty() {
        return Err(AppError::Validation("Missing offer_id".into()));
    }
    state
        .commerce
        .commit_offer(&request.offer_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Offer not found or expired".into()))
}

/// `GET /api/order/{id}`
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    state
        .commerce
        .get_order(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".into()))
}
