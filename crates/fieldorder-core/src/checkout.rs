//! # Checkout Payload
//!
//! The snapshot handed to the persistence collaborator when the order is
//! submitted, and the reverse mapping used to seed an edit session from a
//! stored order.
//!
//! ## Shape
//! ```text
//! CheckoutPayload
//! ├── lines[]          regular line + the free lines it earned
//! │   ├── line         (priced)
//! │   └── bonuses[]    (zero priced, free_gift_for = line.product_id)
//! ├── order_gift       order-level gift, earned by no single line
//! ├── choices          either/or picks, stored with the order
//! └── summary          totals at submission time
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::choice::SchemeChoice;
use crate::line::{LineItemSet, OrderLine};
use crate::summary::OrderSummary;

/// A regular line with its attached bonuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub line: OrderLine,
    pub bonuses: Vec<OrderLine>,
}

/// Everything the persistence layer stores for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub lines: Vec<CheckoutLine>,
    pub order_gift: Option<OrderLine>,
    pub choices: BTreeMap<String, SchemeChoice>,
    pub summary: OrderSummary,
}

impl CheckoutPayload {
    pub(crate) fn build(
        lines: &LineItemSet,
        choices: BTreeMap<String, SchemeChoice>,
        summary: OrderSummary,
    ) -> Self {
        let checkout_lines = lines
            .regular()
            .iter()
            .map(|line| CheckoutLine {
                line: line.clone(),
                bonuses: lines.free_for(&line.product_id).cloned().collect(),
            })
            .collect();

        CheckoutPayload {
            lines: checkout_lines,
            order_gift: lines.order_gift().cloned(),
            choices,
            summary,
        }
    }

    /// Flattened rows for storage: each regular line followed by its
    /// bonuses, then the order gift.
    pub fn persisted_lines(&self) -> Vec<OrderLine> {
        let mut rows = Vec::new();
        for entry in &self.lines {
            rows.push(entry.line.clone());
            rows.extend(entry.bonuses.iter().cloned());
        }
        rows.extend(self.order_gift.iter().cloned());
        rows
    }

    pub fn regular_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().map(|entry| &entry.line)
    }

    pub fn free_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines
            .iter()
            .flat_map(|entry| entry.bonuses.iter())
            .chain(self.order_gift.iter())
    }

    /// JSON snapshot kept alongside the stored order for audit display.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Maps stored lines back to regular lines for an edit session.
///
/// Free rows are dropped: bonuses are regenerated by the evaluator, never
/// trusted from history. Rows with a non-positive quantity are skipped and
/// duplicate product rows are merged so one product keeps one line.
pub fn regular_lines_from_history(history: &[OrderLine]) -> Vec<OrderLine> {
    let mut regular: Vec<OrderLine> = Vec::new();

    for row in history.iter().filter(|r| !r.is_free && r.quantity > 0) {
        match regular.iter_mut().find(|l| l.product_id == row.product_id) {
            Some(existing) => {
                let quantity = existing.quantity.saturating_add(row.quantity);
                existing.set_quantity(quantity);
            }
            None => {
                let mut line = row.clone();
                line.free_gift_for = None;
                line.scheme_id = None;
                line.set_quantity(row.quantity);
                regular.push(line);
            }
        }
    }

    regular
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            category: None,
            list_price_cents: price,
            trade_price_cents: None,
            unit: None,
            scheme_id: None,
            buy_qty: 0,
            get_qty: 0,
            offer_product_id: None,
            offer_product_name: None,
            is_active: true,
        }
    }

    #[test]
    fn test_history_drops_free_rows() {
        let history = vec![
            OrderLine::regular(&product("A", 100), 3),
            OrderLine::free(&product("A", 100), 1, Some("A"), 1),
            OrderLine::free(&product("GIFT", 0), 1, None, 4),
            OrderLine::regular(&product("B", 50), 0),
        ];

        let regular = regular_lines_from_history(&history);
        assert_eq!(regular.len(), 1);
        assert_eq!(regular[0].product_id, "A");
        assert_eq!(regular[0].quantity, 3);
        assert!(!regular[0].is_free);
    }

    #[test]
    fn test_history_merges_duplicate_products() {
        let history = vec![
            OrderLine::regular(&product("A", 100), 2),
            OrderLine::regular(&product("A", 100), 3),
        ];

        let regular = regular_lines_from_history(&history);
        assert_eq!(regular.len(), 1);
        assert_eq!(regular[0].quantity, 5);
        assert_eq!(regular[0].amount_cents, 500);
    }

    #[test]
    fn test_history_recomputes_stale_amounts() {
        let mut row = OrderLine::regular(&product("A", 100), 2);
        row.amount_cents = 12345;

        let regular = regular_lines_from_history(&[row]);
        assert_eq!(regular[0].amount_cents, 200);
    }
}
