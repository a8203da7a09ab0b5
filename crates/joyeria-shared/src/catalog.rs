//! Product catalog wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Extra free text shown under the name; searchable.
    #[serde(default)]
    pub meta: String,
    pub category: String,
    pub material: String,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    /// Owning user. Set at creation, never reassigned.
    pub seller: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A numeric field that clients may send either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(f64),
    Text(String),
}

impl NumberLike {
    /// The finite value, or `None` when the text does not parse.
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            NumberLike::Number(n) => *n,
            NumberLike::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// The value as a whole number, or `None` when it has a fractional part.
    pub fn to_i64(&self) -> Option<i64> {
        let value = self.to_f64()?;
        (value.fract() == 0.0 && value.abs() < i64::MAX as f64).then_some(value as i64)
    }
}

impl From<f64> for NumberLike {
    fn from(n: f64) -> Self {
        NumberLike::Number(n)
    }
}

/// Image URLs, sent either as an array or as one comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageList {
    List(Vec<String>),
    Csv(String),
}

impl ImageList {
    /// Ordered, trimmed, non-empty URLs.
    pub fn normalize(&self) -> Vec<String> {
        let clean = |s: &str| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        };
        match self {
            ImageList::List(items) => items.iter().filter_map(|s| clean(s)).collect(),
            ImageList::Csv(text) => text.split(',').filter_map(clean).collect(),
        }
    }
}

/// Untyped product input bag for create and update.
///
/// Only the fields listed here are ever read; anything else in the request
/// body (including `seller`) is dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImageList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<NumberLike>,
}

/// One rung of the storefront's price filter ladder. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub id: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }

    pub fn by_id(id: &str) -> Option<&'static PriceRange> {
        PRICE_RANGES.iter().find(|r| r.id == id)
    }
}

pub static PRICE_RANGES: [PriceRange; 3] = [
    PriceRange {
        id: "r1",
        label: "50k - 100k",
        min: 50_000.0,
        max: 100_000.0,
    },
    PriceRange {
        id: "r2",
        label: "100k - 500k",
        min: 100_000.0,
        max: 500_000.0,
    },
    PriceRange {
        id: "r3",
        label: "500k - 1M",
        min: 500_000.0,
        max: 1_000_000.0,
    },
];

/// Exact-match narrowing for product listings (`GET /api/products?...`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
}
