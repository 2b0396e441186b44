use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::ucp::{build_jsonld, load_capabilities, load_products_document, stable_stringify};

const CACHE_CONTROL: &str = "public, max-age=3600";

/// Serve a canonicalized document with a SHA-256 ETag and a 1-hour cache
/// window; a matching `If-None-Match` short-circuits to 304.
fn cached_document(headers: &HeaderMap, body: String, content_type: &'static str) -> Response {
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(body.as_bytes())));

    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if if_none_match == Some(etag.as_str()) {
        return (
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, etag),
                (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            ],
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            (header::ETAG, etag),
        ],
        body,
    )
        .into_response()
}

/// `GET /.well-known/ucp-capabilities.json`
pub async fn capabilities(headers: HeaderMap) -> Result<Response, AppError> {
    let data = load_capabilities()?;
    let body = stable_stringify(&serde_json::to_value(&data)?);
    Ok(cached_document(&headers, body, "application/json"))
}

/// `GET /.well-known/ucp-capabilities.jsonld`
pub async fn capabilities_jsonld(headers: HeaderMap) -> Result<Response, AppError> {
    let data = load_capabilities()?;
    let body = stable_stringify(&build_jsonld(&data));
    Ok(cached_document(&headers, body, "application/ld+json"))
}

/// `GET /.well-known/ucp-products.json`
pub async fn products(headers: HeaderMap) -> Result<Response, AppError> {
    let document = load_products_document()?;
    let body = stable_stringify(&document);
    Ok(cached_document(&headers, body, "application/json"))
}
