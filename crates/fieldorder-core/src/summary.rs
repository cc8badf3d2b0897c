//! # Order Summary
//!
//! Totals derived from the current line set for the order screen footer and
//! for checkout.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::CatalogSnapshot;
use crate::evaluator::regular_subtotal;
use crate::line::{LineItemSet, OrderLine};
use crate::money::Money;

/// Progress toward the order-level gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdProgress {
    pub min_price_cents: i64,
    pub met: bool,
    /// How much more the regular subtotal needs; 0 once met.
    pub remaining_cents: i64,
}

/// Footer totals for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// Distinct regular lines.
    pub line_count: usize,
    /// Sum of regular quantities.
    pub item_count: i64,
    /// Sum of free quantities, gift included.
    pub free_item_count: i64,
    /// Sum of regular amounts. Free lines never contribute.
    pub subtotal_cents: i64,
    pub has_free_items: bool,
    /// `None` when the catalog has no active order-level scheme.
    pub threshold: Option<ThresholdProgress>,
}

impl OrderSummary {
    /// Computes the summary. The threshold is recomputed from the subtotal
    /// rather than read off the gift line, so it is reported as met even when
    /// the gift product itself could not be resolved.
    pub fn compute(lines: &LineItemSet, catalog: &CatalogSnapshot) -> Self {
        let subtotal = regular_subtotal(lines.regular());

        let threshold = catalog.order_threshold().map(|t| ThresholdProgress {
            min_price_cents: t.min_price.cents(),
            met: subtotal >= t.min_price,
            remaining_cents: t.min_price.shortfall_from(subtotal).cents(),
        });

        OrderSummary {
            line_count: lines.regular().len(),
            item_count: saturating_units(lines.regular()),
            free_item_count: saturating_units(lines.free()),
            subtotal_cents: subtotal.cents(),
            has_free_items: !lines.free().is_empty(),
            threshold,
        }
    }

    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn threshold_met(&self) -> bool {
        self.threshold.map(|t| t.met).unwrap_or(false)
    }
}

fn saturating_units(lines: &[OrderLine]) -> i64 {
    lines.iter().fold(0i64, |acc, l| acc.saturating_add(l.quantity))
}
