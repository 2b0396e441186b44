use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::catalog::ColorOption;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub product_id: String,
    pub product_name: String,
    pub color: ColorOption,
    pub size: Option<String>,
    pub quantity: u32,
    pub variant: String,
    #[serde(rename = "designSVG")]
    pub design_svg: String,
    pub text: String,
    pub icon: String,
    pub price: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_estimate_days: Option<u32>,
}

/// Everything a cart line needs except its id, which the store assigns.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: String,
    pub product_name: String,
    pub color: ColorOption,
    pub size: Option<String>,
    pub quantity: u32,
    pub variant: String,
    #[serde(rename = "designSVG")]
    pub design_svg: String,
    pub text: String,
    pub icon: String,
    pub price: f64,
    pub currency: Option<String>,
    pub delivery_estimate_days: Option<u32>,
}

/// Flat cart list. Every mutation replaces the stored list wholesale and
/// returns the new list, mirroring how the storefront persists it under a
/// single key.
#[derive(Debug, Default)]
pub struct CartStore {
    items: Mutex<Vec<CartItem>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<CartItem> {
        self.items.lock().expect("cart lock").clone()
    }

    pub fn add(&self, new_item: NewCartItem) -> Vec<CartItem> {
        let item = CartItem {
            id: chrono::Utc::now().timestamp_millis(),
            total: new_item.price * new_item.quantity as f64,
            product_id: new_item.product_id,
            product_name: new_item.product_name,
            color: new_item.color,
            size: new_item.size,
            quantity: new_item.quantity,
            variant: new_item.variant,
            design_svg: new_item.design_svg,
            text: new_item.text,
            icon: new_item.icon,
            price: new_item.price,
            currency: new_item.currency,
            delivery_estimate_days: new_item.delivery_estimate_days,
        };

        let mut guard = self.items.lock().expect("cart lock");
        let mut next = guard.clone();
        next.push(item);
        *guard = next.clone();
        next
    }

    pub fn remove(&self, id: i64) -> Vec<CartItem> {
        let mut guard = self.items.lock().expect("cart lock");
        let next: Vec<CartItem> = guard.iter().filter(|item| item.id != id).cloned().collect();
        *guard = next.clone();
        next
    }

    pub fn update_quantity(&self, id: i64, quantity: u32) -> Vec<CartItem> {
        let mut guard = self.items.lock().expect("cart lock");
        let next: Vec<CartItem> = guard
            .iter()
            .map(|item| {
                if item.id == id {
                    let mut updated = item.clone();
                    updated.quantity = quantity;
                    updated.total = updated.price * quantity as f64;
                    updated
                } else {
                    item.clone()
                }
            })
            .collect();
        *guard = next.clone();
        next
    }

    pub fn clear(&self) {
        *self.items.lock().expect("cart lock") = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(quantity: u32) -> NewCartItem {
        NewCartItem {
            product_id: "classic-tee".into(),
            product_name: "Classic Tee".into(),
            color: ColorOption {
                name: "Navy".into(),
                hex: "#1e3a5f".into(),
            },
            size: Some("M".into()),
            quantity,
            variant: "A".into(),
            design_svg: "<svg/>".into(),
            text: "Stay Wild".into(),
            icon: "star".into(),
            price: 19.99,
            currency: Some("EUR".into()),
            delivery_estimate_days: Some(7),
        }
    }

    #[test]
    fn test_add_computes_total_and_assigns_id() {
        let store = CartStore::new();
        let cart = store.add(new_item(2));
        assert_eq!(cart.len(), 1);
        assert!(cart[0].id > 0);
        assert!((cart[0].total - 39.98).abs() < 1e-9);
    }

    #[test]
    fn test_update_quantity_recomputes_total() {
        let store = CartStore::new();
        let cart = store.add(new_item(1));
        let id = cart[0].id;
        let cart = store.update_quantity(id, 3);
        assert_eq!(cart[0].quantity, 3);
        assert!((cart[0].total - 59.97).abs() < 1e-9);
        // Unknown id leaves the list untouched
        let before = store.list();
        assert_eq!(store.update_quantity(999, 5), before);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = CartStore::new();
        let cart = store.add(new_item(1));
        let id = cart[0].id;
        assert!(store.remove(id).is_empty());

        store.add(new_item(1));
        store.clear();
        assert!(store.list().is_empty());
    }
}
