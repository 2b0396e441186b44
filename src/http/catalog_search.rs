use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::config::to_absolute_url;
use crate::inventory::AcpItem;

const MAX_LIMIT: usize = 50;
const DEFAULT_LIMIT: usize = 12;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub material: String,
    pub max_price: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub items: Vec<AcpItem>,
}

/// `GET /api/catalog/search`: case-insensitive substring/equality filters
/// over the searchable inventory. `count` reports the full match count even
/// when `limit` truncates the returned page.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let query = params.q.to_lowercase();
    let category = params.category.to_lowercase();
    let color = params.color.to_lowercase();
    let material = params.material.to_lowercase();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let items: Vec<AcpItem> = state
        .inventory
        .items()
        .iter()
        .filter(|item| item.is_eligible_search)
        .filter(|item| {
            query.is_empty()
                || item.title.to_lowercase().contains(&query)
                || item.description.to_lowercase().contains(&query)
                || item
                    .attributes
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&query))
        })
        .filter(|item| category.is_empty() || item.attributes.category.as_str() == category)
        .filter(|item| color.is_empty() || item.has_color(&color))
        .filter(|item| {
            material.is_empty()
                || item
                    .attributes
                    .materials
                    .iter()
                    .any(|m| m.to_lowercase() == material)
        })
        .filter(|item| {
            params
                .max_price
                .map(|max| item.price.amount <= max)
                .unwrap_or(true)
        })
        .cloned()
        .collect();

    let count = items.len();
    // External consumers need absolute image references.
    let items = items
        .into_iter()
        .take(limit)
        .map(|mut item| {
            item.image_url = to_absolute_url(&state.config.public_base_url, &item.image_url);
            item
        })
        .collect();
    Json(SearchResponse { count, items })
}
