use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Flat print fee added on top of the product base price at checkout.
pub const PRINT_FEE: f64 = 3.00;

/// Product category. Doubles as a resolution key for utterances like
/// "a hoodie" that name the category rather than the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tee,
    Hoodie,
    Tote,
    Mug,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tee => "tee",
            Category::Hoodie => "hoodie",
            Category::Tote => "tote",
            Category::Mug => "mug",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tee" => Some(Category::Tee),
            "hoodie" => Some(Category::Hoodie),
            "tote" => Some(Category::Tote),
            "mug" => Some(Category::Mug),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorOption {
    pub name: String,
    pub hex: String,
}

/// Print-area rectangle in percentage coordinates of the product image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintArea {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub base_price: f64,
    pub colors: Vec<ColorOption>,
    /// `None` means a one-size item (totes, mugs).
    pub sizes: Option<Vec<String>>,
    pub print_area: PrintArea,
    pub emoji: String,
}

impl Product {
    /// Case-insensitive membership test against the product's color names.
    pub fn has_color(&self, name: &str) -> bool {
        self.colors.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// What one printed unit costs: base price plus the print fee.
    pub fn unit_price(&self) -> f64 {
        self.base_price + PRINT_FEE
    }

    pub fn has_size(&self, size: &str) -> bool {
        match &self.sizes {
            Some(sizes) => sizes.iter().any(|s| s.eq_ignore_ascii_case(size)),
            None => false,
        }
    }
}

fn color(name: &str, hex: &str) -> ColorOption {
    ColorOption {
        name: name.to_string(),
        hex: hex.to_string(),
    }
}

static PRODUCTS: LazyLock<Vec<Product>> = LazyLock::new(|| {
    vec![
        Product {
            id: "classic-tee".into(),
            name: "Classic Tee".into(),
            category: Category::Tee,
            base_price: 19.99,
            colors: vec![
                color("Black", "#1a1a1a"),
                color("White", "#f5f5f5"),
                color("Navy", "#1e3a5f"),
                color("Forest", "#2d5016"),
                color("Burgundy", "#6b1f3a"),
            ],
            sizes: Some(vec![
                "XS".into(),
                "S".into(),
                "M".into(),
                "L".into(),
                "XL".into(),
                "2XL".into(),
            ]),
            print_area: PrintArea {
                x: 30.0,
                y: 25.0,
                w: 40.0,
                h: 45.0,
            },
            emoji: "\u{1F455}".into(),
        },
        Product {
            id: "hoodie".into(),
            name: "Comfort Hoodie".into(),
            category: Category::Hoodie,
            base_price: 39.99,
            colors: vec![
                color("Black", "#1a1a1a"),
                color("Charcoal", "#4a4a4a"),
                color("Navy", "#1e3a5f"),
                color("Burgundy", "#6b1f3a"),
            ],
            sizes: Some(vec![
                "S".into(),
                "M".into(),
                "L".into(),
                "XL".into(),
                "2XL".into(),
            ]),
            print_area: PrintArea {
                x: 30.0,
                y: 28.0,
                w: 40.0,
                h: 40.0,
            },
            emoji: "\u{1F9E5}".into(),
        },
        Product {
            id: "tote".into(),
            name: "Canvas Tote".into(),
            category: Category::Tote,
            base_price: 14.99,
            colors: vec![color("Natural", "#f5f1e8"), color("Black", "#1a1a1a")],
            sizes: None,
            print_area: PrintArea {
                x: 25.0,
                y: 35.0,
                w: 50.0,
                h: 35.0,
            },
            emoji: "\u{1F45C}".into(),
        },
        Product {
            id: "mug".into(),
            name: "Ceramic Mug".into(),
            category: Category::Mug,
            base_price: 12.99,
            colors: vec![color("White", "#ffffff"), color("Black", "#1a1a1a")],
            sizes: None,
            print_area: PrintArea {
                x: 20.0,
                y: 30.0,
                w: 60.0,
                h: 40.0,
            },
            emoji: "\u{2615}".into(),
        },
    ]
});

pub fn products() -> &'static [Product] {
    &PRODUCTS
}

/// Resolve a product reference by id, exact name, or category name.
pub fn resolve_product(reference: &str) -> Option<&'static Product> {
    let needle = reference.trim();
    if needle.is_empty() {
        return None;
    }
    products()
        .iter()
        .find(|p| p.id == needle)
        .or_else(|| {
            products()
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(needle))
        })
        .or_else(|| {
            let cat = Category::parse(&needle.to_lowercase())?;
            products().iter().find(|p| p.category == cat)
        })
}

pub fn product_by_id(id: &str) -> Option<&'static Product> {
    products().iter().find(|p| p.id == id)
}
