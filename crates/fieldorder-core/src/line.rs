//! # Line-Item Set
//!
//! The working collection of order lines for one shop visit.
//!
//! ## Two Kinds of Lines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  REGULAR lines                        FREE lines                        │
//! │  ─────────────────────                ─────────────────────             │
//! │  created by increment()               created by the evaluator only     │
//! │  quantity >= 1, always                unit price = 0, always            │
//! │  unit price frozen at insert          free_gift_for = earning product   │
//! │  mutated by the user                  (None for the order-level gift)   │
//! │                                       replaced wholesale on every pass  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Regular lines keep their insertion order; free lines always follow them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Product;
use crate::money::Money;

// =============================================================================
// Order Line
// =============================================================================

/// A single order line, either user-entered or engine-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `quantity * unit_price_cents`, kept in sync by every mutation.
    pub amount_cents: i64,
    pub is_free: bool,
    /// Product id of the regular line that earned this bonus.
    pub free_gift_for: Option<String>,
    /// Scheme that produced this line.
    pub scheme_id: Option<i64>,
}

impl OrderLine {
    /// Creates a regular line, freezing the product's unit price.
    pub fn regular(product: &Product, quantity: i64) -> Self {
        let unit_price = product.unit_price();
        OrderLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            unit: product.unit.clone(),
            quantity,
            unit_price_cents: unit_price.cents(),
            amount_cents: unit_price.multiply_quantity(quantity).cents(),
            is_free: false,
            free_gift_for: None,
            scheme_id: None,
        }
    }

    /// Creates a zero-priced bonus line.
    pub fn free(
        product: &Product,
        quantity: i64,
        free_gift_for: Option<&str>,
        scheme_id: i64,
    ) -> Self {
        OrderLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            unit: product.unit.clone(),
            quantity,
            unit_price_cents: 0,
            amount_cents: 0,
            is_free: true,
            free_gift_for: free_gift_for.map(str::to_string),
            scheme_id: Some(scheme_id),
        }
    }

    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Sets the quantity and recomputes the amount from the frozen price.
    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.amount_cents = self.unit_price().multiply_quantity(quantity).cents();
    }

    /// Whether this is the order-level gift (free, earned by no product).
    pub fn is_order_gift(&self) -> bool {
        self.is_free && self.free_gift_for.is_none()
    }
}

// =============================================================================
// Line-Item Set
// =============================================================================

/// Regular lines followed by the current free lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemSet {
    regular: Vec<OrderLine>,
    free: Vec<OrderLine>,
}

impl LineItemSet {
    pub fn new() -> Self {
        LineItemSet::default()
    }

    /// All lines: regular first, then free.
    pub fn iter(&self) -> impl Iterator<Item = &OrderLine> {
        self.regular.iter().chain(self.free.iter())
    }

    pub fn to_vec(&self) -> Vec<OrderLine> {
        self.iter().cloned().collect()
    }

    pub fn regular(&self) -> &[OrderLine] {
        &self.regular
    }

    pub fn free(&self) -> &[OrderLine] {
        &self.free
    }

    pub fn regular_line(&self, product_id: &str) -> Option<&OrderLine> {
        self.regular.iter().find(|l| l.product_id == product_id)
    }

    pub(crate) fn regular_line_mut(&mut self, product_id: &str) -> Option<&mut OrderLine> {
        self.regular.iter_mut().find(|l| l.product_id == product_id)
    }

    pub(crate) fn push_regular(&mut self, line: OrderLine) {
        debug_assert!(!line.is_free);
        self.regular.push(line);
    }

    /// Removes a regular line, returning it if present.
    pub(crate) fn remove_regular(&mut self, product_id: &str) -> Option<OrderLine> {
        let index = self.regular.iter().position(|l| l.product_id == product_id)?;
        Some(self.regular.remove(index))
    }

    /// Swaps in a freshly evaluated free-line set.
    pub(crate) fn replace_free(&mut self, free: Vec<OrderLine>) {
        self.free = free;
    }

    pub(crate) fn clear(&mut self) {
        self.regular.clear();
        self.free.clear();
    }

    /// Free lines earned by one regular line.
    pub fn free_for<'a>(&'a self, product_id: &'a str) -> impl Iterator<Item = &'a OrderLine> + 'a {
        self.free
            .iter()
            .filter(move |l| l.free_gift_for.as_deref() == Some(product_id))
    }

    pub fn order_gift(&self) -> Option<&OrderLine> {
        self.free.iter().find(|l| l.is_order_gift())
    }

    pub fn len(&self) -> usize {
        self.regular.len() + self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.free.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: None,
            list_price_cents: price,
            trade_price_cents: None,
            unit: Some("pcs".to_string()),
            scheme_id: None,
            buy_qty: 0,
            get_qty: 0,
            offer_product_id: None,
            offer_product_name: None,
            is_active: true,
        }
    }

    #[test]
    fn test_regular_line_amount() {
        let mut line = OrderLine::regular(&product("A", 250), 2);
        assert_eq!(line.amount_cents, 500);
        assert!(!line.is_free);

        line.set_quantity(5);
        assert_eq!(line.amount().cents(), 1250);
    }

    #[test]
    fn test_free_line_is_zero_priced() {
        let line = OrderLine::free(&product("B", 999), 3, Some("A"), 2);
        assert_eq!(line.unit_price_cents, 0);
        assert_eq!(line.amount_cents, 0);
        assert_eq!(line.free_gift_for.as_deref(), Some("A"));
        assert_eq!(line.scheme_id, Some(2));
        assert!(!line.is_order_gift());

        let gift = OrderLine::free(&product("G", 0), 1, None, 4);
        assert!(gift.is_order_gift());
    }

    #[test]
    fn test_set_keeps_regular_before_free() {
        let mut set = LineItemSet::new();
        set.push_regular(OrderLine::regular(&product("A", 100), 1));
        set.replace_free(vec![OrderLine::free(&product("A", 100), 1, Some("A"), 1)]);
        set.push_regular(OrderLine::regular(&product("B", 100), 1));

        let ids: Vec<(&str, bool)> = set.iter().map(|l| (l.product_id.as_str(), l.is_free)).collect();
        assert_eq!(ids, vec![("A", false), ("B", false), ("A", true)]);
        assert_eq!(set.free_for("A").count(), 1);
        assert_eq!(set.free_for("B").count(), 0);
    }

    #[test]
    fn test_remove_regular() {
        let mut set = LineItemSet::new();
        set.push_regular(OrderLine::regular(&product("A", 100), 1));
        assert!(set.remove_regular("A").is_some());
        assert!(set.remove_regular("A").is_none());
        assert!(set.is_empty());
    }
}
