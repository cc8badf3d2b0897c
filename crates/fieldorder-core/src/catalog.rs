//! # Catalog Snapshot
//!
//! Read-only product and scheme records for one shop visit.
//!
//! ## Where Scheme Data Lives
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product                              Scheme                            │
//! │  ─────────────────────                ─────────────────────             │
//! │  id, name, category, unit             scheme_id (1..=4)                 │
//! │  list_price / trade_price             scope (product | order)           │
//! │  scheme_id ──────────────┐            min_price   (order scope)         │
//! │  buy_qty, get_qty        │            gift_product_id (order scope)     │
//! │  offer_product_id        └──────────► kind is decided by the id alone   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product-scope scheme terms sit on the product record itself, so at most
//! one scheme can apply to a product. Scheme records are only consulted for
//! the order-level threshold gift.
//!
//! The snapshot is built once per fetch and never mutated. Until the first
//! fetch resolves the session runs against [`CatalogSnapshot::empty`], which
//! grants no bonuses because no product can be resolved.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Scheme Kind
// =============================================================================

/// The four promotional scheme kinds, keyed by their catalog id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    /// 1 - buy X, get Y of the same product.
    BuyGetSame,
    /// 2 - buy X, get Y of the same product OR one offer product per set.
    BuyGetEitherOr,
    /// 3 - buy X, get Y of the same product AND one offer product per set.
    BuyGetBothAnd,
    /// 4 - order subtotal at or above a threshold earns one gift.
    OrderThreshold,
}

impl SchemeKind {
    /// Maps a catalog scheme id to its kind. Unknown ids mean "no scheme".
    pub const fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(SchemeKind::BuyGetSame),
            2 => Some(SchemeKind::BuyGetEitherOr),
            3 => Some(SchemeKind::BuyGetBothAnd),
            4 => Some(SchemeKind::OrderThreshold),
            _ => None,
        }
    }

    pub const fn id(&self) -> i64 {
        match self {
            SchemeKind::BuyGetSame => 1,
            SchemeKind::BuyGetEitherOr => 2,
            SchemeKind::BuyGetBothAnd => 3,
            SchemeKind::OrderThreshold => 4,
        }
    }

    /// Whether this kind is evaluated per product line.
    pub const fn is_product_scope(&self) -> bool {
        !matches!(self, SchemeKind::OrderThreshold)
    }
}

// =============================================================================
// Scheme Scope
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SchemeScope {
    Product,
    Order,
}

// =============================================================================
// Product
// =============================================================================

/// A product available to order during a shop visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    /// Display name shown on the order screen and receipt.
    pub name: String,

    pub category: Option<String>,

    /// Retail list price in minor units.
    pub list_price_cents: i64,

    /// Distributor trade price. Preferred over the list price when set.
    pub trade_price_cents: Option<i64>,

    /// Unit of measure (e.g. "carton", "pcs").
    pub unit: Option<String>,

    /// Scheme linkage. `None` or 0 means no scheme.
    pub scheme_id: Option<i64>,

    /// Quantity that completes one set.
    pub buy_qty: i64,

    /// Free units of the same product per completed set.
    pub get_qty: i64,

    /// A different product handed out as the bonus (kinds 2 and 3).
    pub offer_product_id: Option<String>,

    /// Denormalized name of the offer product, for display.
    pub offer_product_name: Option<String>,

    pub is_active: bool,
}

impl Product {
    /// Unit price frozen into a regular line: trade price when set and
    /// positive, list price otherwise.
    pub fn unit_price(&self) -> Money {
        match self.trade_price_cents {
            Some(trade) if trade > 0 => Money::from_cents(trade),
            _ => Money::from_cents(self.list_price_cents),
        }
    }

    /// The scheme kind linked to this product, if any.
    pub fn scheme_kind(&self) -> Option<SchemeKind> {
        self.scheme_id.and_then(SchemeKind::from_id)
    }

    /// Product-scope terms, or `None` when no per-product scheme applies.
    ///
    /// Order-threshold ids on a product and non-positive buy quantities are
    /// treated as "no scheme" rather than rejected.
    pub fn scheme_terms(&self) -> Option<SchemeTerms<'_>> {
        let kind = self.scheme_kind()?;
        if !kind.is_product_scope() || self.buy_qty <= 0 {
            return None;
        }

        Some(SchemeTerms {
            kind,
            buy_qty: self.buy_qty,
            get_qty: self.get_qty.max(0),
            offer_product_id: self.offer_product_id.as_deref(),
        })
    }
}

/// The per-product scheme terms the evaluator dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemeTerms<'a> {
    pub kind: SchemeKind,
    pub buy_qty: i64,
    pub get_qty: i64,
    pub offer_product_id: Option<&'a str>,
}

impl SchemeTerms<'_> {
    /// Number of complete sets in `quantity`. Partial progress counts for
    /// nothing.
    pub fn completed_sets(&self, quantity: i64) -> i64 {
        if quantity < self.buy_qty {
            return 0;
        }
        quantity / self.buy_qty
    }
}

// =============================================================================
// Scheme
// =============================================================================

/// A scheme record from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Scheme {
    pub scheme_id: i64,
    pub scope: SchemeScope,

    /// Subtotal threshold for order-scope schemes.
    pub min_price_cents: Option<i64>,

    pub description: Option<String>,

    /// The fixed, schemeless product given as the order-level gift.
    pub gift_product_id: Option<String>,

    pub is_active: bool,
}

impl Scheme {
    pub fn kind(&self) -> Option<SchemeKind> {
        SchemeKind::from_id(self.scheme_id)
    }

    pub fn min_price(&self) -> Option<Money> {
        self.min_price_cents.map(Money::from_cents)
    }
}

/// The order-level threshold scheme in effect for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderThreshold<'a> {
    pub scheme_id: i64,
    pub min_price: Money,
    pub gift_product_id: Option<&'a str>,
}

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// Immutable view over the active products and schemes.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    products: HashMap<String, Product>,
    schemes: Vec<Scheme>,
}

impl CatalogSnapshot {
    /// Builds a snapshot, keeping only active records.
    pub fn new(products: Vec<Product>, schemes: Vec<Scheme>) -> Self {
        let products = products
            .into_iter()
            .filter(|p| p.is_active)
            .map(|p| (p.id.clone(), p))
            .collect();
        let schemes = schemes.into_iter().filter(|s| s.is_active).collect();

        CatalogSnapshot { products, schemes }
    }

    /// The snapshot used before the catalog fetch resolves.
    pub fn empty() -> Self {
        CatalogSnapshot::default()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.schemes.is_empty()
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Products sorted by category then name, for the product picker.
    pub fn products_sorted(&self) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.products.values().collect();
        products.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        products
    }

    pub fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }

    /// Resolves a product's offer product. Dangling references yield `None`.
    pub fn offer_product_for(&self, product: &Product) -> Option<&Product> {
        product
            .offer_product_id
            .as_deref()
            .and_then(|id| self.product(id))
    }

    /// The order-level threshold scheme, if one is active and has a
    /// threshold. The first matching record wins.
    pub fn order_threshold(&self) -> Option<OrderThreshold<'_>> {
        self.schemes
            .iter()
            .filter(|s| s.scope == SchemeScope::Order)
            .filter(|s| s.kind() == Some(SchemeKind::OrderThreshold))
            .find_map(|s| {
                s.min_price().map(|min_price| OrderThreshold {
                    scheme_id: s.scheme_id,
                    min_price,
                    gift_product_id: s.gift_product_id.as_deref(),
                })
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
