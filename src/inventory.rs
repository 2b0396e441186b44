use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, ColorOption};
use crate::error::AppError;

/// ACP inventory feed, embedded at compile time.
const INVENTORY_JSON: &str = include_str!("../data/inventory.acp.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcpPrice {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "in stock")]
    InStock,
    #[serde(rename = "out of stock")]
    OutOfStock,
    #[serde(rename = "preorder")]
    Preorder,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in stock",
            Availability::OutOfStock => "out of stock",
            Availability::Preorder => "preorder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcpVariants {
    pub sizes: Vec<String>,
    pub colors: Vec<ColorOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcpAttributes {
    pub category: Category,
    pub materials: Vec<String>,
    pub lead_time_days: u32,
    pub min_qty: u32,
    pub tags: Vec<String>,
    pub variants: AcpVariants,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcpItem {
    pub item_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url_by_variant: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_by_variant: Option<HashMap<String, String>>,
    pub price: AcpPrice,
    pub availability: Availability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_date: Option<String>,
    pub is_eligible_search: bool,
    pub is_eligible_checkout: bool,
    pub attributes: AcpAttributes,
}

impl AcpItem {
    /// Sustainability is derived, not declared: eco tag or an organic/
    /// recycled material counts.
    pub fn is_sustainable(&self) -> bool {
        self.attributes.tags.iter().any(|t| t == "eco")
            || self
                .attributes
                .materials
                .iter()
                .any(|m| m == "organic" || m == "recycled" || m.contains("organic") || m.contains("recycled"))
    }

    pub fn has_color(&self, name: &str) -> bool {
        self.attributes
            .variants
            .colors
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Per-variant map key: `"color|material"`, lowercased, whitespace to hyphens.
pub fn variant_key(color: &str, material: &str) -> String {
    let joined = format!("{}|{}", color, material).to_lowercase();
    let mut key = String::with_capacity(joined.len());
    let mut in_space = false;
    for ch in joined.chars() {
        if ch.is_whitespace() {
            if !in_space {
                key.push('-');
                in_space = true;
            }
        } else {
            key.push(ch);
            in_space = false;
        }
    }
    key
}

/// Static inventory wrapper so tests can run against fixtures while the
/// service uses the embedded feed.
#[derive(Debug, Clone)]
pub struct Inventory {
    items: Vec<AcpItem>,
}

impl Inventory {
    pub fn load_embedded() -> Result<Self, AppError> {
        let items: Vec<AcpItem> = serde_json::from_str(INVENTORY_JSON)?;
        if items.is_empty() {
            return Err(AppError::Internal("embedded inventory is empty".into()));
        }
        Ok(Self { items })
    }

    pub fn from_items(items: Vec<AcpItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[AcpItem] {
        &self.items
    }

    pub fn by_id(&self, item_id: &str) -> Option<&AcpItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Inventory {
        Inventory::load_embedded().expect("embedded inventory must decode")
    }

    #[test]
    fn test_embedded_inventory_decodes() {
        assert!(!inventory().items().is_empty());
    }

    #[test]
    fn test_variant_key_normalization() {
        assert_eq!(variant_key("White", "Organic Cotton"), "white|organic-cotton");
        assert_eq!(variant_key("Navy", "cotton"), "navy|cotton");
    }

    #[test]
    fn test_items_have_required_attributes() {
        // Mirrors the feed-level sanity checks the discovery engine relies on.
        for item in inventory().items() {
            assert!(!item.item_id.is_empty());
            assert!(
                !item.attributes.materials.is_empty(),
                "missing materials for {}",
                item.item_id
            );
            assert!(
                !item.attributes.variants.colors.is_empty(),
                "missing colors for {}",
                item.item_id
            );
        }
    }

    #[test]
    fn test_variant_maps_use_normalized_keys() {
        for item in inventory().items() {
            let maps = [
                item.image_url_by_variant.as_ref(),
                item.availability_by_variant.as_ref(),
            ];
            for map in maps.into_iter().flatten() {
                for key in map.keys() {
                    assert!(
                        key.contains('|') && *key == key.to_lowercase() && !key.contains(' '),
                        "unnormalized variant key {} on {}",
                        key,
                        item.item_id
                    );
                }
            }
        }
    }

    #[test]
    fn test_every_item_matches_its_own_constraints() {
        // Each item must survive a filter built from its own attributes,
        // otherwise the feed and the discovery engine disagree.
        use crate::engine::discover::{filter_inventory, DiscoverConstraints};

        let inv = inventory();
        for item in inv.items() {
            if item.availability != Availability::InStock || !item.is_eligible_search {
                continue;
            }
            let constraints = DiscoverConstraints {
                category: Some(item.attributes.category),
                budget_max: Some(item.price.amount),
                materials: Some(vec![item.attributes.materials[0].clone()]),
                color: Some(item.attributes.variants.colors[0].name.to_lowercase()),
                size: item.attributes.variants.sizes.first().cloned(),
                lead_time_max: Some(item.attributes.lead_time_days),
                ..Default::default()
            };
            let matches = filter_inventory(inv.items(), &constraints);
            assert!(
                matches.iter().any(|m| m.item_id == item.item_id),
                "constraint self-match failed for {}",
                item.item_id
            );
        }
    }

    #[test]
    fn test_sustainability_is_derived() {
        let inv = inventory();
        let eco = inv
            .items()
            .iter()
            .find(|i| i.attributes.tags.iter().any(|t| t == "eco"));
        if let Some(item) = eco {
            assert!(item.is_sustainable());
        }
    }
}
