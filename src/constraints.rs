use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{resolve_product, ColorOption, Product};
use crate::engine::conversation::Stage;
use crate::icons::icon_by_id;

/// Customization bounds. The text limit moved across product revisions, so
/// it is configuration rather than a constant.
#[derive(Debug, Clone)]
pub struct CustomizationLimits {
    pub text_max_length: usize,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

impl Default for CustomizationLimits {
    fn default() -> Self {
        Self {
            text_max_length: 50,
            min_quantity: 1,
            max_quantity: 99,
        }
    }
}

pub const OCCASIONS: &[&str] = &["gift", "team", "event", "personal"];
pub const VIBES: &[&str] = &["minimal", "bold", "retro", "cute", "sporty"];

/// Design/text color palette, independent of any product.
pub static TEXT_COLOR_OPTIONS: LazyLock<Vec<ColorOption>> = LazyLock::new(|| {
    [
        ("white", "#ffffff"),
        ("black", "#111111"),
        ("navy", "#1e3a5f"),
        ("forest", "#2d5016"),
        ("burgundy", "#6b1f3a"),
        ("charcoal", "#4a4a4a"),
        ("natural", "#f5f1e8"),
        ("red", "#e4002b"),
        ("pink", "#ff6fb1"),
        ("blue", "#2f6fed"),
        ("green", "#2d9d78"),
    ]
    .iter()
    .map(|(name, hex)| ColorOption {
        name: (*name).to_string(),
        hex: (*hex).to_string(),
    })
    .collect()
});

/// Broad color vocabulary used for product colors before a product is
/// resolved, so "navy tee" works in one utterance regardless of which
/// field gets extracted first.
pub const GENERIC_COLORS: &[&str] = &[
    "black", "white", "red", "navy", "forest", "burgundy", "charcoal", "natural", "pink", "blue",
    "green",
];

pub const GENERIC_SIZES: &[&str] = &["XS", "S", "M", "L", "XL", "2XL"];

/// Values models emit when they echo the schema instead of filling it.
const PLACEHOLDER_TOKENS: &[&str] = &[
    "string", "number", "text", "color", "size", "null", "undefined", "n/a", "unknown",
];

/// Recognized control tokens carried alongside field updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AddToCart,
    RemoveIcon,
}

/// The sanitized subset of a raw update object. Every field was either
/// decoded successfully or dropped; nothing here needs re-checking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SanitizedUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_time_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl SanitizedUpdates {
    pub fn is_empty(&self) -> bool {
        *self == SanitizedUpdates::default()
    }
}

/// Why a single field was dropped. Never surfaced to callers (the public
/// contract is silent-drop) but attributed in debug logs.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FieldError {
    #[error("missing")]
    Missing,
    #[error("wrong type")]
    WrongType,
    #[error("placeholder token {0:?}")]
    Placeholder(String),
    #[error("{0:?} not in vocabulary")]
    OutOfVocabulary(String),
    #[error("length {0} over limit")]
    TooLong(usize),
    #[error("not a positive number")]
    NotPositive,
    #[error("unknown product {0:?}")]
    UnknownProduct(String),
}

/// Collapse internal whitespace runs to single spaces and trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn get_str(raw: &Value, key: &str) -> Result<String, FieldError> {
    match raw.get(key) {
        None | Some(Value::Null) => Err(FieldError::Missing),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(FieldError::WrongType),
    }
}

fn reject_placeholder(value: &str) -> Result<(), FieldError> {
    if PLACEHOLDER_TOKENS.contains(&value) {
        return Err(FieldError::Placeholder(value.to_string()));
    }
    Ok(())
}

fn decode_product_id(raw: &Value) -> Result<String, FieldError> {
    let reference = get_str(raw, "productId")?;
    match resolve_product(&reference) {
        Some(product) => Ok(product.id.clone()),
        None => Err(FieldError::UnknownProduct(reference)),
    }
}

fn decode_vocab(raw: &Value, key: &str, vocab: &[&str]) -> Result<String, FieldError> {
    let value = get_str(raw, key)?.to_lowercase();
    if vocab.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(FieldError::OutOfVocabulary(value))
    }
}

fn decode_text(raw: &Value, limits: &CustomizationLimits) -> Result<String, FieldError> {
    let text = normalize_text(&get_str(raw, "text")?);
    if text.is_empty() {
        return Err(FieldError::Missing);
    }
    let len = text.chars().count();
    if len > limits.text_max_length {
        return Err(FieldError::TooLong(len));
    }
    Ok(text)
}

fn decode_icon_id(raw: &Value) -> Result<String, FieldError> {
    let id = get_str(raw, "iconId")?.to_lowercase();
    match icon_by_id(&id) {
        Some(icon) => Ok(icon.id.to_string()),
        None => Err(FieldError::OutOfVocabulary(id)),
    }
}

fn decode_product_color(raw: &Value, product: Option<&Product>) -> Result<String, FieldError> {
    let color = get_str(raw, "productColor")
        .or_else(|_| get_str(raw, "color"))?
        .to_lowercase();
    reject_placeholder(&color)?;
    match product {
        // A resolved product's declared colors are authoritative.
        Some(p) if p.has_color(&color) => Ok(color),
        Some(_) => Err(FieldError::OutOfVocabulary(color)),
        None if GENERIC_COLORS.contains(&color.as_str()) => Ok(color),
        None => Err(FieldError::OutOfVocabulary(color)),
    }
}

fn decode_text_color(raw: &Value) -> Result<String, FieldError> {
    let color = get_str(raw, "textColor")?.to_lowercase();
    reject_placeholder(&color)?;
    if TEXT_COLOR_OPTIONS.iter().any(|c| c.name == color) {
        Ok(color)
    } else {
        Err(FieldError::OutOfVocabulary(color))
    }
}

fn decode_size(raw: &Value, product: Option<&Product>) -> Result<String, FieldError> {
    let size = get_str(raw, "size")?;
    reject_placeholder(&size.to_lowercase())?;
    let size = size.to_uppercase();
    let allowed = match product {
        Some(p) if p.sizes.is_some() => p.has_size(&size),
        _ => GENERIC_SIZES.contains(&size.as_str()),
    };
    if allowed {
        Ok(size)
    } else {
        Err(FieldError::OutOfVocabulary(size))
    }
}

fn decode_quantity(raw: &Value, limits: &CustomizationLimits) -> Result<u32, FieldError> {
    let qty = match raw.get("quantity") {
        None | Some(Value::Null) => return Err(FieldError::Missing),
        Some(v) => v.as_f64().ok_or(FieldError::WrongType)?,
    };
    if !qty.is_finite() {
        return Err(FieldError::WrongType);
    }
    let floored = qty.floor();
    let clamped = floored
        .max(limits.min_quantity as f64)
        .min(limits.max_quantity as f64);
    Ok(clamped as u32)
}

fn decode_positive_f64(raw: &Value, key: &str) -> Result<f64, FieldError> {
    let value = match raw.get(key) {
        None | Some(Value::Null) => return Err(FieldError::Missing),
        Some(v) => v.as_f64().ok_or(FieldError::WrongType)?,
    };
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FieldError::NotPositive)
    }
}

fn decode_positive_u32(raw: &Value, key: &str) -> Result<u32, FieldError> {
    let value = decode_positive_f64(raw, key)?;
    Ok(value.floor() as u32)
}

fn decode_string_array(raw: &Value, key: &str) -> Result<Vec<String>, FieldError> {
    let arr = match raw.get(key) {
        None | Some(Value::Null) => return Err(FieldError::Missing),
        Some(Value::Array(a)) => a,
        Some(_) => return Err(FieldError::WrongType),
    };
    // Non-string entries are dropped rather than failing the whole list.
    let values: Vec<String> = arr
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.to_lowercase())
        .collect();
    if values.is_empty() {
        Err(FieldError::Missing)
    } else {
        Ok(values)
    }
}

fn decode_stage(raw: &Value) -> Result<Stage, FieldError> {
    let value = get_str(raw, "stage")?.to_lowercase();
    Stage::parse(&value).ok_or(FieldError::OutOfVocabulary(value))
}

fn decode_action(raw: &Value) -> Result<Action, FieldError> {
    let value = get_str(raw, "action")?;
    match value.as_str() {
        "add_to_cart" => Ok(Action::AddToCart),
        "remove_icon" => Ok(Action::RemoveIcon),
        _ => Err(FieldError::OutOfVocabulary(value)),
    }
}

fn keep<T>(field: &'static str, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(FieldError::Missing) => None,
        Err(err) => {
            tracing::debug!(field, %err, "dropped invalid update field");
            None
        }
    }
}

/// Sanitize a raw update object from either extraction path.
///
/// Pure and total: invalid, placeholder, and unknown fields are dropped,
/// never propagated, because upstream sources (especially model output)
/// routinely emit well-typed garbage. Idempotent by construction:
/// re-validating an already-sanitized object is a no-op.
///
/// `product` is the currently-resolved product, when there is one; color
/// and size validation tighten from the generic vocabularies to the
/// product's declared options as soon as it is known.
pub fn validate(
    raw: &Value,
    product: Option<&Product>,
    limits: &CustomizationLimits,
) -> SanitizedUpdates {
    if !raw.is_object() {
        return SanitizedUpdates::default();
    }

    SanitizedUpdates {
        stage: keep("stage", decode_stage(raw)),
        product_id: keep("productId", decode_product_id(raw)),
        occasion: keep("occasion", decode_vocab(raw, "occasion", OCCASIONS)),
        vibe: keep("vibe", decode_vocab(raw, "vibe", VIBES)),
        text: keep("text", decode_text(raw, limits)),
        icon_id: keep("iconId", decode_icon_id(raw)),
        product_color: keep("productColor", decode_product_color(raw, product)),
        text_color: keep("textColor", decode_text_color(raw)),
        size: keep("size", decode_size(raw, product)),
        quantity: keep("quantity", decode_quantity(raw, limits)),
        budget_max: keep("budgetMax", decode_positive_f64(raw, "budgetMax")),
        lead_time_max: keep("leadTimeMax", decode_positive_u32(raw, "leadTimeMax")),
        materials: keep("materials", decode_string_array(raw, "materials")),
        tags: keep("tags", decode_string_array(raw, "tags")),
        action: keep("action", decode_action(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product_by_id;
    use serde_json::json;

    fn limits() -> CustomizationLimits {
        CustomizationLimits::default()
    }

    #[test]
    fn test_validate_is_idempotent() {
        let raw = json!({
            "productId": "tee",
            "text": "  Stay   Wild  ",
            "iconId": "STAR",
            "productColor": "Navy",
            "textColor": "WHITE",
            "size": "m",
            "quantity": 250,
            "budgetMax": 30.0,
            "materials": ["Cotton", 7, "canvas"],
            "action": "add_to_cart"
        });
        let once = validate(&raw, None, &limits());
        let round_tripped = serde_json::to_value(&once).unwrap();
        let twice = validate(&round_tripped, None, &limits());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_product_resolution_by_id_name_category() {
        for reference in ["classic-tee", "Classic Tee", "tee"] {
            let raw = json!({ "productId": reference });
            assert_eq!(
                validate(&raw, None, &limits()).product_id.as_deref(),
                Some("classic-tee"),
                "failed for {reference}"
            );
        }
        let raw = json!({ "productId": "skirt" });
        assert!(validate(&raw, None, &limits()).product_id.is_none());
    }

    #[test]
    fn test_text_normalized_and_bounded() {
        let raw = json!({ "text": "  Stay \t  Wild " });
        assert_eq!(
            validate(&raw, None, &limits()).text.as_deref(),
            Some("Stay Wild")
        );

        let at_limit = "x".repeat(limits().text_max_length);
        let raw = json!({ "text": at_limit });
        assert_eq!(
            validate(&raw, None, &limits()).text.as_deref(),
            Some(at_limit.as_str())
        );

        let over = "x".repeat(limits().text_max_length + 1);
        let raw = json!({ "text": over });
        assert!(validate(&raw, None, &limits()).text.is_none());
    }

    #[test]
    fn test_placeholder_tokens_rejected() {
        let raw = json!({ "productColor": "string", "textColor": "color", "size": "size" });
        let updates = validate(&raw, None, &limits());
        assert!(updates.product_color.is_none());
        assert!(updates.text_color.is_none());
        assert!(updates.size.is_none());
    }

    #[test]
    fn test_product_color_against_resolved_product() {
        let tee = product_by_id("classic-tee").unwrap();
        let raw = json!({ "productColor": "Navy" });
        assert_eq!(
            validate(&raw, Some(tee), &limits()).product_color.as_deref(),
            Some("navy")
        );
        // Pink is in the generic vocabulary but not on the tee.
        let raw = json!({ "productColor": "pink" });
        assert!(validate(&raw, Some(tee), &limits()).product_color.is_none());
        assert_eq!(
            validate(&raw, None, &limits()).product_color.as_deref(),
            Some("pink")
        );
    }

    #[test]
    fn test_color_alias_key_accepted() {
        let raw = json!({ "color": "navy" });
        assert_eq!(
            validate(&raw, None, &limits()).product_color.as_deref(),
            Some("navy")
        );
    }

    #[test]
    fn test_size_uppercased_and_validated() {
        let hoodie = product_by_id("hoodie").unwrap();
        let raw = json!({ "size": "xl" });
        assert_eq!(
            validate(&raw, Some(hoodie), &limits()).size.as_deref(),
            Some("XL")
        );
        // Hoodie has no XS.
        let raw = json!({ "size": "xs" });
        assert!(validate(&raw, Some(hoodie), &limits()).size.is_none());
        assert_eq!(validate(&raw, None, &limits()).size.as_deref(), Some("XS"));
    }

    #[test]
    fn test_quantity_floored_and_clamped() {
        for (input, expected) in [
            (json!(3.9), 3),
            (json!(0), 1),
            (json!(-5), 1),
            (json!(250), 99),
            (json!(99), 99),
            (json!(1), 1),
        ] {
            let raw = json!({ "quantity": input });
            assert_eq!(
                validate(&raw, None, &limits()).quantity,
                Some(expected),
                "input {input}"
            );
        }
        let raw = json!({ "quantity": "three" });
        assert!(validate(&raw, None, &limits()).quantity.is_none());
    }

    #[test]
    fn test_budget_and_lead_time_require_positive() {
        let raw = json!({ "budgetMax": 25.5, "leadTimeMax": 10 });
        let updates = validate(&raw, None, &limits());
        assert_eq!(updates.budget_max, Some(25.5));
        assert_eq!(updates.lead_time_max, Some(10));

        let raw = json!({ "budgetMax": -3, "leadTimeMax": 0 });
        let updates = validate(&raw, None, &limits());
        assert!(updates.budget_max.is_none());
        assert!(updates.lead_time_max.is_none());
    }

    #[test]
    fn test_string_arrays_drop_non_strings() {
        let raw = json!({ "materials": ["Cotton", 7, null, "canvas"], "tags": [1, 2] });
        let updates = validate(&raw, None, &limits());
        assert_eq!(
            updates.materials,
            Some(vec!["cotton".to_string(), "canvas".to_string()])
        );
        assert!(updates.tags.is_none());
    }

    #[test]
    fn test_action_tokens() {
        let raw = json!({ "action": "add_to_cart" });
        assert_eq!(
            validate(&raw, None, &limits()).action,
            Some(Action::AddToCart)
        );
        let raw = json!({ "action": "remove_icon" });
        assert_eq!(
            validate(&raw, None, &limits()).action,
            Some(Action::RemoveIcon)
        );
        let raw = json!({ "action": "checkout" });
        assert!(validate(&raw, None, &limits()).action.is_none());
    }

    #[test]
    fn test_non_object_input_yields_empty() {
        for raw in [json!(null), json!("string"), json!([1, 2, 3]), json!(42)] {
            assert!(validate(&raw, None, &limits()).is_empty());
        }
    }

    #[test]
    fn test_icon_vocabulary_membership() {
        let raw = json!({ "iconId": "star" });
        assert_eq!(
            validate(&raw, None, &limits()).icon_id.as_deref(),
            Some("star")
        );
        let raw = json!({ "iconId": "dragon" });
        assert!(validate(&raw, None, &limits()).icon_id.is_none());
    }
}
