use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Category;
use crate::constraints::{validate, CustomizationLimits, OCCASIONS};
use crate::engine::extract::extract_json;
use crate::engine::llm::{ChatBackend, ChatMessage};
use crate::engine::prompt::build_discover_prompt;
use crate::inventory::{variant_key, AcpItem, Availability, Inventory};

const TOP_N: usize = 3;

const MATERIAL_KEYWORDS: &[&str] = &[
    "cotton", "canvas", "ceramic", "organic", "recycled", "poly", "polyester", "enamel",
];
const TAG_KEYWORDS: &[&str] = &["eco", "sustainable", "minimal", "bold", "retro", "cute", "sporty"];
const COLOR_KEYWORDS: &[&str] = &[
    "white", "black", "navy", "forest", "burgundy", "natural", "charcoal",
];
const SIZE_KEYWORDS: &[&str] = &["xs", "s", "m", "l", "xl", "2xl"];
const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

static BUDGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:under|less than|below)\s*[€$]?(\d+(?:\.\d+)?)").expect("budget regex")
});
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[€$](\d+(?:\.\d+)?)").expect("price regex"));
static QTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:items|pcs|pieces|shirts|hoodies|totes|mugs)").expect("qty regex")
});
static LEAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:under|less than|within|in)\s*(\d+)\s*days?").expect("lead-time regex")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverStage {
    #[default]
    Welcome,
    Constraints,
    Results,
}

/// Accumulated discovery constraints. All optional and additive across
/// turns: a new value replaces the old one, absence leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoverConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sustainable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_time_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl DiscoverConstraints {
    /// Additive merge: fields set in `updates` win, everything else stays.
    pub fn merged_with(&self, updates: &DiscoverConstraints) -> DiscoverConstraints {
        DiscoverConstraints {
            category: updates.category.or(self.category),
            budget_max: updates.budget_max.or(self.budget_max),
            materials: updates.materials.clone().or_else(|| self.materials.clone()),
            sustainable: updates.sustainable.or(self.sustainable),
            quantity: updates.quantity.or(self.quantity),
            event_date: updates
                .event_date
                .clone()
                .or_else(|| self.event_date.clone()),
            tags: updates.tags.clone().or_else(|| self.tags.clone()),
            occasion: updates.occasion.clone().or_else(|| self.occasion.clone()),
            color: updates.color.clone().or_else(|| self.color.clone()),
            lead_time_max: updates.lead_time_max.or(self.lead_time_max),
            size: updates.size.clone().or_else(|| self.size.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DiscoverConstraints::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverState {
    pub stage: DiscoverStage,
    pub constraints: DiscoverConstraints,
}

/// One ranked recommendation. Field names mirror the wire format consumed
/// by the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryResult {
    pub item_id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url_selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url_fallback: Option<String>,
    pub price: String,
    pub tags: Vec<String>,
    pub reason: String,
    #[serde(rename = "leadTimeDays")]
    pub lead_time_days: u32,
    pub availability: String,
    #[serde(rename = "matchedColor", skip_serializing_if = "Option::is_none")]
    pub matched_color: Option<String>,
    #[serde(rename = "matchedColorHex", skip_serializing_if = "Option::is_none")]
    pub matched_color_hex: Option<String>,
    #[serde(rename = "matchedMaterial", skip_serializing_if = "Option::is_none")]
    pub matched_material: Option<String>,
    #[serde(rename = "variantAvailability", skip_serializing_if = "Option::is_none")]
    pub variant_availability: Option<String>,
}

// ============================================================================
// Deterministic constraint parsing
// ============================================================================

pub fn is_materials_question(message: &str) -> bool {
    let text = message.to_lowercase();
    text.contains("fabric") || text.contains("material")
}

/// Materials actually available under the current constraints, sorted.
pub fn available_materials(inventory: &Inventory, constraints: &DiscoverConstraints) -> Vec<String> {
    let mut materials: Vec<String> = filter_inventory(inventory.items(), constraints)
        .iter()
        .flat_map(|item| item.attributes.materials.iter().cloned())
        .collect();
    materials.sort();
    materials.dedup();
    materials
}

/// Keyword extraction over a discovery utterance. No I/O; this is the whole
/// engine when the model path is down.
pub fn parse_constraints(message: &str) -> DiscoverConstraints {
    let text = message.to_lowercase();
    let mut updates = DiscoverConstraints::default();

    for (category, keywords) in [
        (Category::Tee, ["tee", "t-shirt", "shirt"].as_slice()),
        (Category::Hoodie, &["hoodie", "sweatshirt"]),
        (Category::Tote, &["tote", "bag"]),
        (Category::Mug, &["mug", "cup"]),
    ] {
        if keywords.iter().any(|k| text.contains(k)) {
            updates.category = Some(category);
            break;
        }
    }

    for (occasion, keywords) in [
        ("gift", ["gift", "present", "birthday"].as_slice()),
        ("team", &["team", "group", "club"]),
        ("event", &["event", "party", "concert"]),
        ("personal", &["personal", "myself", "for me"]),
    ] {
        if keywords.iter().any(|k| text.contains(k)) {
            updates.occasion = Some(occasion.to_string());
            break;
        }
    }

    if text.contains("sustainable") || text.contains("eco") {
        updates.sustainable = Some(true);
    }

    let materials: Vec<String> = MATERIAL_KEYWORDS
        .iter()
        .filter(|m| text.contains(*m))
        .map(|m| m.to_string())
        .collect();
    if !materials.is_empty() {
        updates.materials = Some(materials);
    }

    let tags: Vec<String> = TAG_KEYWORDS
        .iter()
        .filter(|t| text.contains(*t))
        .map(|t| t.to_string())
        .collect();
    if !tags.is_empty() {
        updates.tags = Some(tags);
    }

    if let Some(color) = COLOR_KEYWORDS.iter().find(|c| text.contains(*c)) {
        updates.color = Some(color.to_string());
    }

    for size in SIZE_KEYWORDS {
        let word = Regex::new(&format!(r"\b{size}\b")).expect("size regex");
        if word.is_match(&text) {
            updates.size = Some(size.to_uppercase());
            break;
        }
    }

    if let Some(captures) = BUDGET_RE.captures(&text) {
        updates.budget_max = captures[1].parse().ok();
    }
    if updates.budget_max.is_none() {
        if let Some(captures) = PRICE_RE.captures(&text) {
            updates.budget_max = captures[1].parse().ok();
        }
    }

    if let Some(captures) = QTY_RE.captures(&text) {
        updates.quantity = captures[1].parse().ok();
    }

    if let Some(captures) = LEAD_RE.captures(&text) {
        updates.lead_time_max = captures[1].parse().ok();
    }

    if let Some(month) = MONTHS.iter().find(|m| {
        Regex::new(&format!(r"\b{m}\b"))
            .expect("month regex")
            .is_match(&text)
    }) {
        updates.event_date = Some(month.to_string());
    }

    updates
}

// ============================================================================
// Filter and score
// ============================================================================

/// Hard AND-filter: any failing predicate excludes the item.
pub fn filter_inventory<'a>(
    items: &'a [AcpItem],
    constraints: &DiscoverConstraints,
) -> Vec<&'a AcpItem> {
    items
        .iter()
        .filter(|item| {
            if !item.is_eligible_search {
                return false;
            }
            if item.availability != Availability::InStock {
                return false;
            }
            if let Some(category) = constraints.category {
                if item.attributes.category != category {
                    return false;
                }
            }
            if let Some(budget) = constraints.budget_max {
                if item.price.amount > budget {
                    return false;
                }
            }
            if constraints.sustainable == Some(true) && !item.is_sustainable() {
                return false;
            }
            if let Some(ref materials) = constraints.materials {
                if !materials.is_empty()
                    && !materials
                        .iter()
                        .any(|m| item.attributes.materials.contains(m))
                {
                    return false;
                }
            }
            if let Some(ref tags) = constraints.tags {
                if !tags.is_empty() && !tags.iter().any(|t| item.attributes.tags.contains(t)) {
                    return false;
                }
            }
            if let Some(lead_max) = constraints.lead_time_max {
                if item.attributes.lead_time_days > lead_max {
                    return false;
                }
            }
            if let Some(ref color) = constraints.color {
                if !item.has_color(color) {
                    return false;
                }
            }
            if let Some(ref size) = constraints.size {
                let sizes = &item.attributes.variants.sizes;
                if sizes.is_empty() || !sizes.contains(size) {
                    return false;
                }
            }
            // Variant-level availability overrides item-level: a base item
            // can be in stock while the requested color/material combo is
            // sold out.
            if let (Some(color), Some(materials)) = (&constraints.color, &constraints.materials) {
                let material = materials
                    .iter()
                    .find(|m| item.attributes.materials.contains(m));
                if let (Some(material), Some(by_variant)) =
                    (material, item.availability_by_variant.as_ref())
                {
                    if by_variant.get(&variant_key(color, material)).map(String::as_str)
                        == Some("out of stock")
                    {
                        return false;
                    }
                }
            }
            true
        })
        .collect()
}

/// Additive point scoring. Not normalized; only the relative order within
/// one filtered set matters.
pub fn score_item(item: &AcpItem, constraints: &DiscoverConstraints) -> u32 {
    let mut score = 0;
    if constraints.category == Some(item.attributes.category) {
        score += 3;
    }
    if constraints
        .budget_max
        .is_some_and(|budget| item.price.amount <= budget)
    {
        score += 2;
    }
    if constraints.sustainable == Some(true) && item.is_sustainable() {
        score += 2;
    }
    if let Some(ref materials) = constraints.materials {
        score += materials
            .iter()
            .filter(|m| item.attributes.materials.contains(m))
            .count() as u32;
    }
    if let Some(ref tags) = constraints.tags {
        score += tags
            .iter()
            .filter(|t| item.attributes.tags.contains(t))
            .count() as u32;
    }
    if constraints
        .color
        .as_deref()
        .is_some_and(|color| item.has_color(color))
    {
        score += 1;
    }
    if constraints
        .size
        .as_ref()
        .is_some_and(|size| item.attributes.variants.sizes.contains(size))
    {
        score += 1;
    }
    if constraints
        .occasion
        .as_ref()
        .is_some_and(|occasion| item.attributes.tags.contains(occasion))
    {
        score += 1;
    }
    score
}

fn build_result(item: &AcpItem, constraints: &DiscoverConstraints) -> InventoryResult {
    let mut reasons: Vec<String> = Vec::new();
    if let Some(category) = constraints.category {
        reasons.push(format!("matches {}", category.as_str()));
    }
    if let Some(budget) = constraints.budget_max {
        reasons.push(format!("under €{budget}"));
    }
    if constraints.sustainable == Some(true) && item.is_sustainable() {
        reasons.push("sustainable-friendly".to_string());
    }
    if let Some(quantity) = constraints.quantity {
        if item.attributes.min_qty > quantity {
            reasons.push(format!("min qty {}", item.attributes.min_qty));
        }
    }

    let matched = constraints.color.as_deref().and_then(|color| {
        item.attributes
            .variants
            .colors
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(color))
    });
    let matched_material = constraints.materials.as_ref().and_then(|materials| {
        materials
            .iter()
            .find(|m| item.attributes.materials.contains(m))
            .cloned()
    });

    // Best-effort variant image: exact color|material key, then color with
    // the item's only material, then any variant image, then the base image.
    let mut image_url_selected = None;
    if let (Some(color), Some(material), Some(images)) = (
        matched.map(|c| c.name.as_str()),
        matched_material.as_deref(),
        item.image_url_by_variant.as_ref(),
    ) {
        image_url_selected = images.get(&variant_key(color, material)).cloned();
    } else if let (Some(color), Some(images)) =
        (matched.map(|c| c.name.as_str()), item.image_url_by_variant.as_ref())
    {
        if item.attributes.materials.len() == 1 {
            image_url_selected = images
                .get(&variant_key(color, &item.attributes.materials[0]))
                .cloned();
        }
    }
    let image_url_fallback = item
        .image_url_by_variant
        .as_ref()
        .and_then(|images| {
            let mut keys: Vec<&String> = images.keys().collect();
            keys.sort();
            keys.first().map(|k| images[*k].clone())
        });

    let variant_availability = match (
        matched.map(|c| c.name.as_str()),
        matched_material.as_deref(),
        item.availability_by_variant.as_ref(),
    ) {
        (Some(color), Some(material), Some(by_variant)) => {
            by_variant.get(&variant_key(color, material)).cloned()
        }
        _ => None,
    };

    InventoryResult {
        item_id: item.item_id.clone(),
        title: item.title.clone(),
        description: item.description.clone(),
        image_url: item.image_url.clone(),
        image_url_selected,
        image_url_fallback,
        price: format!("€{:.2}", item.price.amount),
        tags: item.attributes.tags.clone(),
        reason: if reasons.is_empty() {
            "popular pick".to_string()
        } else {
            reasons.join(", ")
        },
        lead_time_days: item.attributes.lead_time_days,
        availability: item.availability.as_str().to_string(),
        matched_color: matched.map(|c| c.name.clone()),
        matched_color_hex: matched.map(|c| c.hex.clone()),
        matched_material,
        variant_availability,
    }
}

/// Filter, score, sort descending, keep the top 3, and attach a
/// human-readable reason per survivor. Deterministic: the sort is stable,
/// so ties keep feed order.
pub fn rank_inventory(
    inventory: &Inventory,
    constraints: &DiscoverConstraints,
) -> Vec<InventoryResult> {
    let mut scored: Vec<(&AcpItem, u32)> = filter_inventory(inventory.items(), constraints)
        .into_iter()
        .map(|item| (item, score_item(item, constraints)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(TOP_N)
        .map(|(item, _)| build_result(item, constraints))
        .collect()
}

/// Result of the relaxation ladder: what matched and which constraints had
/// to go to get there.
#[derive(Debug, Clone, Serialize)]
pub struct RelaxedRanking {
    pub results: Vec<InventoryResult>,
    pub dropped: Vec<&'static str>,
}

/// When a strict filter yields nothing, drop constraints in a fixed
/// priority order (color, then materials, then lead time), re-filtering
/// after each drop and stopping at the first non-empty set. Powers the
/// "we don't have X, but here's what we do have" reply without a second
/// model call.
pub fn relax_constraints(
    inventory: &Inventory,
    constraints: &DiscoverConstraints,
) -> RelaxedRanking {
    let mut relaxed = constraints.clone();
    let mut dropped = Vec::new();

    let steps: [(&'static str, fn(&mut DiscoverConstraints)); 3] = [
        ("color", |c| c.color = None),
        ("materials", |c| c.materials = None),
        ("lead time", |c| c.lead_time_max = None),
    ];

    for (name, drop) in steps {
        let results = rank_inventory(inventory, &relaxed);
        if !results.is_empty() {
            return RelaxedRanking { results, dropped };
        }
        drop(&mut relaxed);
        dropped.push(name);
    }

    RelaxedRanking {
        results: rank_inventory(inventory, &relaxed),
        dropped,
    }
}

// ============================================================================
// Turn processing
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selection {
    pub primary_ids: Vec<String>,
    pub fallback_ids: Vec<String>,
    pub rationale: Option<String>,
}

/// Outcome of one discovery turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResult {
    pub assistant_message: String,
    pub updates: DiscoverUpdates,
    pub results: Vec<InventoryResult>,
    pub fallback_used: bool,
}

/// The turn's constraint updates with the advisory stage riding along,
/// exactly as the client applies them.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverUpdates {
    #[serde(flatten)]
    pub constraints: DiscoverConstraints,
    pub stage: DiscoverStage,
}

/// Decode raw model updates into discovery constraints, reusing the shared
/// validator for the overlapping fields.
fn sanitize_discover_updates(raw: &Value) -> DiscoverConstraints {
    let shared = validate(raw, None, &CustomizationLimits::default());

    let category = raw
        .get("category")
        .and_then(|v| v.as_str())
        .and_then(|s| Category::parse(&s.to_lowercase()));
    let sustainable = raw.get("sustainable").and_then(|v| v.as_bool());
    let event_date = raw
        .get("eventDate")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty());
    // Bulk orders routinely exceed the per-cart clamp, so quantity is only
    // required to be a positive integer here.
    let quantity = raw
        .get("quantity")
        .and_then(|v| v.as_f64())
        .filter(|q| q.is_finite() && *q >= 1.0)
        .map(|q| q.floor() as u32);
    let occasion = raw
        .get("occasion")
        .and_then(|v| v.as_str())
        .map(|s| s.to_lowercase())
        .filter(|s| OCCASIONS.contains(&s.as_str()));

    DiscoverConstraints {
        category,
        budget_max: shared.budget_max,
        materials: shared.materials,
        sustainable,
        quantity,
        event_date,
        tags: shared.tags,
        occasion,
        color: shared.product_color,
        lead_time_max: shared.lead_time_max,
        size: shared.size,
    }
}

fn advance_stage(stage: DiscoverStage, from_model: Option<DiscoverStage>) -> DiscoverStage {
    from_model.unwrap_or(match stage {
        DiscoverStage::Welcome => DiscoverStage::Constraints,
        other => other,
    })
}

fn reorder_by_selection(
    results: Vec<InventoryResult>,
    selection: &Selection,
) -> Vec<InventoryResult> {
    let ordered_ids: Vec<&String> = selection
        .primary_ids
        .iter()
        .chain(selection.fallback_ids.iter())
        .collect();
    if ordered_ids.is_empty() {
        return results;
    }

    let mut picked: Vec<InventoryResult> = Vec::new();
    let mut remaining = results;
    for id in ordered_ids {
        if let Some(pos) = remaining.iter().position(|r| r.item_id == *id) {
            picked.push(remaining.remove(pos));
        }
    }
    // Unknown ids are simply ignored; anything unpicked keeps rank order.
    picked.extend(remaining);
    picked
}

fn fallback_turn(
    inventory: &Inventory,
    state: &DiscoverState,
    user_message: &str,
) -> DiscoverResult {
    let updates = parse_constraints(user_message);
    let merged = state.constraints.merged_with(&updates);
    let stage = advance_stage(state.stage, None);

    let strict = rank_inventory(inventory, &merged);
    let (results, dropped) = if strict.is_empty() && !merged.is_empty() {
        let relaxed = relax_constraints(inventory, &merged);
        (relaxed.results, relaxed.dropped)
    } else {
        (strict, Vec::new())
    };

    let assistant_message = if !dropped.is_empty() && !results.is_empty() {
        format!(
            "Nothing matched your exact {} request, but here is the closest we have.",
            dropped.join(" and ")
        )
    } else if stage == DiscoverStage::Constraints && results.is_empty() {
        "Tell me what you need (budget, material, style, quantity, timing) and I'll narrow options."
            .to_string()
    } else {
        "Got it. Here are the best matches based on your constraints.".to_string()
    };

    DiscoverResult {
        assistant_message,
        updates: DiscoverUpdates {
            constraints: updates,
            stage,
        },
        results,
        fallback_used: true,
    }
}

/// Run one discovery turn: deterministic constraint parse, model-assisted
/// extraction over the pre-filtered candidates, deterministic-precedence
/// merge, rank, and optional model-proposed reordering. Degrades to the
/// pure keyword path on any model failure.
pub async fn process_discover_turn(
    backend: &dyn ChatBackend,
    inventory: &Inventory,
    state: &DiscoverState,
    user_message: &str,
) -> DiscoverResult {
    let parsed_updates = parse_constraints(user_message);
    let candidate_constraints = state.constraints.merged_with(&parsed_updates);
    let candidates: Vec<AcpItem> = filter_inventory(inventory.items(), &candidate_constraints)
        .into_iter()
        .cloned()
        .collect();

    let prompt = build_discover_prompt(state, &candidates);
    let messages = [
        ChatMessage::system(prompt),
        ChatMessage::user(user_message),
    ];

    let raw = match backend.complete(&messages, true).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(error = %err, "discover model path unavailable");
            return fallback_turn(inventory, state, user_message);
        }
    };

    let parsed = extract_json(&raw);
    let (assistant, model_updates, selection, model_stage) = match parsed {
        Some(ref value) => {
            let assistant = value
                .get("assistant")
                .and_then(|a| a.as_str())
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty());
            let updates_value = value.get("updates").cloned().unwrap_or(Value::Null);
            let model_updates = sanitize_discover_updates(&updates_value);
            let model_stage = updates_value
                .get("stage")
                .and_then(|s| s.as_str())
                .and_then(|s| match s {
                    "welcome" => Some(DiscoverStage::Welcome),
                    "constraints" => Some(DiscoverStage::Constraints),
                    "results" => Some(DiscoverStage::Results),
                    _ => None,
                });
            let selection: Selection = value
                .get("selection")
                .cloned()
                .and_then(|s| serde_json::from_value(s).ok())
                .unwrap_or_default();
            (assistant, model_updates, selection, model_stage)
        }
        None => (
            // Unparseable reply: keep the text, extract nothing from it.
            Some(raw.trim().to_string()).filter(|t| !t.is_empty()),
            DiscoverConstraints::default(),
            Selection::default(),
            None,
        ),
    };

    // Deterministic extraction wins conflicts, the model fills the rest.
    let updates = model_updates.merged_with(&parsed_updates);
    let merged = state.constraints.merged_with(&updates);
    let stage = advance_stage(state.stage, model_stage);

    let strict = rank_inventory(inventory, &merged);
    let (mut results, dropped) = if strict.is_empty() && !merged.is_empty() {
        let relaxed = relax_constraints(inventory, &merged);
        (relaxed.results, relaxed.dropped)
    } else {
        (strict, Vec::new())
    };

    results = reorder_by_selection(results, &selection);
    if let Some(ref rationale) = selection.rationale {
        for result in &mut results {
            result.reason = rationale.clone();
        }
    }

    let assistant_message = assistant.unwrap_or_else(|| {
        if dropped.is_empty() {
            "Here are the best matches based on your constraints.".to_string()
        } else {
            format!(
                "Nothing matched your exact {} request, but here is the closest we have.",
                dropped.join(" and ")
            )
        }
    });

    DiscoverResult {
        assistant_message,
        updates: DiscoverUpdates {
            constraints: updates,
            stage,
        },
        results,
        fallback_used: false,
    }
}
