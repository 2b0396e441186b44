use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

const CAPABILITIES_JSON: &str = include_str!("../data/ucp-capabilities.json");
const PRODUCTS_JSON: &str = include_str!("../data/ucp-products.json");

/// Merchant capability document served under `/.well-known`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UcpCapabilities {
    pub merchant_id: String,
    pub capabilities: HashMap<String, bool>,
    pub supported_currencies: Vec<String>,
    pub supported_countries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Decode and field-validate the embedded capability document.
pub fn load_capabilities() -> Result<UcpCapabilities, AppError> {
    let data: UcpCapabilities = serde_json::from_str(CAPABILITIES_JSON)?;
    if data.merchant_id.trim().is_empty() {
        return Err(AppError::Validation(
            "ucp capabilities: merchant_id must be a non-empty string".into(),
        ));
    }
    if data
        .supported_currencies
        .iter()
        .chain(data.supported_countries.iter())
        .any(|entry| entry.trim().is_empty())
    {
        return Err(AppError::Validation(
            "ucp capabilities: currency/country entries must be non-empty".into(),
        ));
    }
    Ok(data)
}

/// The raw product feed document, parsed so it can be canonicalized.
pub fn load_products_document() -> Result<Value, AppError> {
    Ok(serde_json::from_str(PRODUCTS_JSON)?)
}

/// Canonical JSON with stably-sorted object keys at every level, so the
/// serialized bytes, and therefore the ETag, never depend on map order.
pub fn stable_stringify(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let entries: Vec<String> = items.iter().map(stable_stringify).collect();
            format!("[{}]", entries.join(","))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let entries: Vec<String> = keys
                .into_iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(key).unwrap_or_default(),
                        stable_stringify(&map[key])
                    )
                })
                .collect();
            format!("{{{}}}", entries.join(","))
        }
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// JSON-LD projection of the capability document: schema.org vocabulary
/// plus a `ucp:` extension for the capability map.
pub fn build_jsonld(data: &UcpCapabilities) -> Value {
    let mut jsonld = serde_json::json!({
        "@context": {
            "@vocab": "https://schema.org/",
            "ucp": "https://merchforge.example.com/ucp#"
        },
        "@type": "Organization",
        "identifier": data.merchant_id,
        "areaServed": data.supported_countries,
        "currenciesAccepted": data.supported_currencies,
        "ucp:capabilities": data.capabilities,
    });
    if let Some(ref notes) = data.notes {
        jsonld["description"] = Value::String(notes.clone());
    }
    jsonld
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_capabilities_load() {
        let data = load_capabilities().unwrap();
        assert!(!data.merchant_id.is_empty());
        assert!(!data.supported_currencies.is_empty());
    }

    #[test]
    fn test_embedded_products_document_loads() {
        let doc = load_products_document().unwrap();
        assert!(doc.is_object() || doc.is_array());
    }

    #[test]
    fn test_stable_stringify_sorts_keys() {
        let value = json!({ "b": 1, "a": { "z": true, "m": [2, 1] } });
        assert_eq!(
            stable_stringify(&value),
            r#"{"a":{"m":[2,1],"z":true},"b":1}"#
        );
    }

    #[test]
    fn test_stable_stringify_is_deterministic() {
        let data = load_capabilities().unwrap();
        let value = serde_json::to_value(&data).unwrap();
        let first = stable_stringify(&value);
        let second = stable_stringify(&serde_json::to_value(&data).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_jsonld_projection() {
        let data = load_capabilities().unwrap();
        let jsonld = build_jsonld(&data);
        assert_eq!(jsonld["@type"], "Organization");
        assert_eq!(jsonld["identifier"], json!(data.merchant_id));
        assert!(jsonld.get("@context").is_some());
        assert!(jsonld.get("ucp:capabilities").is_some());
    }
}
