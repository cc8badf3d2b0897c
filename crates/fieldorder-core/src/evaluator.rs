//! # Scheme Evaluator
//!
//! Derives every free line from the regular lines, the catalog snapshot and
//! the choice store.
//!
//! ## One Pass, From Scratch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  regular lines ──┐                                                      │
//! │  catalog ────────┼──► evaluate() ──► complete free-line set             │
//! │  choices ────────┘                                                      │
//! │                                                                         │
//! │  for each regular line L of product P:                                  │
//! │    no terms / L.qty < buy_qty        → nothing                          │
//! │    sets = L.qty / buy_qty (floor)                                       │
//! │    1  BuyGetSame      → P x sets*get_qty                                │
//! │    2  BuyGetEitherOr  → choice: P x sets*get_qty  OR  offer x sets      │
//! │    3  BuyGetBothAnd   → P x sets*get_qty  AND offer x sets              │
//! │                                                                         │
//! │  then: sum(regular amounts) >= min_price → one order gift               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The previous free lines are never an input, so the output depends only on
//! the three arguments: evaluating twice gives the same lines.

use tracing::debug;

use crate::catalog::{CatalogSnapshot, Product, SchemeKind, SchemeTerms};
use crate::choice::{ChoiceStore, SchemeChoice};
use crate::line::{LineItemSet, OrderLine};
use crate::money::Money;

/// Computes the complete free-line set for `regular`.
///
/// Product bonuses come out in regular-line order; the order-level gift, if
/// earned, is last.
pub fn evaluate(
    regular: &[OrderLine],
    catalog: &CatalogSnapshot,
    choices: &ChoiceStore,
) -> Vec<OrderLine> {
    let mut free = Vec::new();

    for line in regular.iter().filter(|l| !l.is_free) {
        let Some(product) = catalog.product(&line.product_id) else {
            continue;
        };
        let Some(terms) = product.scheme_terms() else {
            continue;
        };

        let sets = terms.completed_sets(line.quantity);
        if sets == 0 {
            continue;
        }

        product_bonuses(product, &terms, sets, catalog, choices, &mut free);
    }

    if let Some(gift) = order_gift(regular, catalog) {
        free.push(gift);
    }

    debug!(
        regular = regular.len(),
        free = free.len(),
        "Evaluated schemes"
    );

    free
}

/// Re-evaluates a line set: regular lines kept as-is, free lines replaced.
pub fn apply(lines: &LineItemSet, catalog: &CatalogSnapshot, choices: &ChoiceStore) -> LineItemSet {
    let mut next = lines.clone();
    next.replace_free(evaluate(lines.regular(), catalog, choices));
    next
}

/// Sum of regular-line amounts. Free lines never count toward thresholds.
pub fn regular_subtotal(regular: &[OrderLine]) -> Money {
    regular
        .iter()
        .filter(|l| !l.is_free)
        .map(OrderLine::amount)
        .sum()
}

fn product_bonuses(
    product: &Product,
    terms: &SchemeTerms<'_>,
    sets: i64,
    catalog: &CatalogSnapshot,
    choices: &ChoiceStore,
    out: &mut Vec<OrderLine>,
) {
    let scheme_id = terms.kind.id();
    // Catalog terms are not validated; an overflowing grant is dropped.
    let same_qty = sets.checked_mul(terms.get_qty).unwrap_or_else(|| {
        debug!(
            product_id = %product.id,
            sets,
            get_qty = terms.get_qty,
            "Same-product bonus overflows, skipping"
        );
        0
    });

    match terms.kind {
        SchemeKind::BuyGetSame => {
            push_same(product, same_qty, scheme_id, out);
        }
        SchemeKind::BuyGetEitherOr => match choices.get(&product.id) {
            SchemeChoice::OfferProduct => {
                push_offer(product, sets, scheme_id, catalog, out);
            }
            // Either/or never grants both; a stored `Both` reads as the default.
            SchemeChoice::FreeQuantity | SchemeChoice::Both => {
                push_same(product, same_qty, scheme_id, out);
            }
        },
        SchemeKind::BuyGetBothAnd => {
            push_same(product, same_qty, scheme_id, out);
            push_offer(product, sets, scheme_id, catalog, out);
        }
        SchemeKind::OrderThreshold => {}
    }
}

fn push_same(product: &Product, quantity: i64, scheme_id: i64, out: &mut Vec<OrderLine>) {
    if quantity > 0 {
        out.push(OrderLine::free(product, quantity, Some(product.id.as_str()), scheme_id));
    }
}

fn push_offer(
    product: &Product,
    quantity: i64,
    scheme_id: i64,
    catalog: &CatalogSnapshot,
    out: &mut Vec<OrderLine>,
) {
    match catalog.offer_product_for(product) {
        Some(offer) => {
            out.push(OrderLine::free(offer, quantity, Some(product.id.as_str()), scheme_id));
        }
        None => {
            debug!(
                product_id = %product.id,
                offer_product_id = ?product.offer_product_id,
                "Offer product not in catalog, skipping bonus"
            );
        }
    }
}

fn order_gift(regular: &[OrderLine], catalog: &CatalogSnapshot) -> Option<OrderLine> {
    let threshold = catalog.order_threshold()?;
    // An empty order earns nothing, even against a zero threshold.
    if !regular.iter().any(|l| !l.is_free) || regular_subtotal(regular) < threshold.min_price {
        return None;
    }

    let gift = threshold.gift_product_id.and_then(|id| catalog.product(id));
    if gift.is_none() {
        debug!(
            gift_product_id = ?threshold.gift_product_id,
            "Order threshold met but gift product not in catalog"
        );
    }

    gift.map(|product| OrderLine::free(product, 1, None, threshold.scheme_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Scheme, SchemeScope};

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: Some("General".to_string()),
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

    fn with_scheme(mut p: Product, scheme_id: i64, buy: i64, get: i64, offer: Option<&str>) -> Product {
        p.scheme_id = Some(scheme_id);
        p.buy_qty = buy;
        p.get_qty = get;
        p.offer_product_id = offer.map(str::to_string);
        p
    }

    fn order_scheme(min_price_cents: i64, gift: &str) -> Scheme {
        Scheme {
            scheme_id: 4,
            scope: SchemeScope::Order,
            min_price_cents: Some(min_price_cents),
            description: Some("Order gift".to_string()),
            gift_product_id: Some(gift.to_string()),
            is_active: true,
        }
    }

    fn line(catalog: &CatalogSnapshot, id: &str, qty: i64) -> OrderLine {
        OrderLine::regular(catalog.product(id).unwrap(), qty)
    }

    #[test]
    fn test_buy_get_same_floors_sets() {
        let catalog = CatalogSnapshot::new(vec![with_scheme(product("A", 100), 1, 5, 1, None)], vec![]);
        let free = evaluate(&[line(&catalog, "A", 12)], &catalog, &ChoiceStore::new());

        assert_eq!(free.len(), 1);
        assert_eq!(free[0].product_id, "A");
        assert_eq!(free[0].quantity, 2);
        assert_eq!(free[0].free_gift_for.as_deref(), Some("A"));
        assert_eq!(free[0].scheme_id, Some(1));
    }

    #[test]
    fn test_one_short_of_threshold_grants_nothing() {
        let catalog = CatalogSnapshot::new(
            vec![
                with_scheme(product("A", 100), 1, 5, 1, None),
                with_scheme(product("B", 100), 2, 4, 1, Some("X")),
                with_scheme(product("C", 100), 3, 3, 2, Some("X")),
                product("X", 50),
            ],
            vec![],
        );
        let regular = vec![line(&catalog, "A", 4), line(&catalog, "B", 3), line(&catalog, "C", 2)];

        assert!(evaluate(&regular, &catalog, &ChoiceStore::new()).is_empty());
    }

    #[test]
    fn test_either_or_follows_choice() {
        let catalog = CatalogSnapshot::new(
            vec![with_scheme(product("A", 100), 2, 3, 1, Some("B")), product("B", 40)],
            vec![],
        );
        let regular = vec![line(&catalog, "A", 7)];
        let mut choices = ChoiceStore::new();

        let free = evaluate(&regular, &catalog, &choices);
        assert_eq!(free.len(), 1);
        assert_eq!((free[0].product_id.as_str(), free[0].quantity), ("A", 2));

        choices.set("A", SchemeChoice::OfferProduct);
        let free = evaluate(&regular, &catalog, &choices);
        assert_eq!(free.len(), 1);
        assert_eq!((free[0].product_id.as_str(), free[0].quantity), ("B", 2));
        assert_eq!(free[0].free_gift_for.as_deref(), Some("A"));

        choices.set("A", SchemeChoice::Both);
        let free = evaluate(&regular, &catalog, &choices);
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].product_id, "A");
    }

    #[test]
    fn test_both_and_grants_two_lines() {
        let catalog = CatalogSnapshot::new(
            vec![with_scheme(product("A", 100), 3, 4, 2, Some("B")), product("B", 40)],
            vec![],
        );
        let free = evaluate(&[line(&catalog, "A", 9)], &catalog, &ChoiceStore::new());

        assert_eq!(free.len(), 2);
        assert_eq!((free[0].product_id.as_str(), free[0].quantity), ("A", 4));
        assert_eq!((free[1].product_id.as_str(), free[1].quantity), ("B", 2));
        assert!(free.iter().all(|l| l.scheme_id == Some(3)));
    }

    #[test]
    fn test_both_and_ignores_stored_choice() {
        let catalog = CatalogSnapshot::new(
            vec![with_scheme(product("A", 100), 3, 4, 2, Some("B")), product("B", 40)],
            vec![],
        );
        let regular = [line(&catalog, "A", 9)];
        let baseline = evaluate(&regular, &catalog, &ChoiceStore::new());

        for choice in [SchemeChoice::FreeQuantity, SchemeChoice::OfferProduct] {
            let mut choices = ChoiceStore::new();
            choices.set("A", choice);

            let free = evaluate(&regular, &catalog, &choices);
            let granted: Vec<_> = free.iter().map(|l| (l.product_id.as_str(), l.quantity)).collect();
            assert_eq!(granted, vec![("A", 4), ("B", 2)], "choice {:?}", choice);
            assert_eq!(free, baseline);
        }
    }

    #[test]
    fn test_overflowing_bonus_is_skipped() {
        let catalog = CatalogSnapshot::new(
            vec![
                with_scheme(product("A", 100), 1, 1, i64::MAX / 2, None),
                with_scheme(product("C", 100), 3, 1, i64::MAX / 2, Some("B")),
                product("B", 40),
            ],
            vec![],
        );

        let free = evaluate(&[line(&catalog, "A", 3), line(&catalog, "C", 3)], &catalog, &ChoiceStore::new());

        assert_eq!(free.len(), 1);
        assert_eq!((free[0].product_id.as_str(), free[0].quantity), ("B", 3));
        assert_eq!(free[0].free_gift_for.as_deref(), Some("C"));
    }

    #[test]
    fn test_dangling_offer_product_is_silent() {
        let catalog = CatalogSnapshot::new(
            vec![
                with_scheme(product("A", 100), 2, 2, 1, Some("MISSING")),
                with_scheme(product("C", 100), 3, 2, 1, Some("MISSING")),
            ],
            vec![],
        );
        let mut choices = ChoiceStore::new();
        choices.set("A", SchemeChoice::OfferProduct);

        let free = evaluate(&[line(&catalog, "A", 4), line(&catalog, "C", 4)], &catalog, &choices);
        // A's offer branch degrades to nothing; C keeps its same-product half.
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].product_id, "C");
    }

    #[test]
    fn test_order_gift_threshold() {
        let catalog = CatalogSnapshot::new(
            vec![product("A", 1000), product("GIFT", 0)],
            vec![order_scheme(5000, "GIFT")],
        );

        let below = evaluate(&[line(&catalog, "A", 4)], &catalog, &ChoiceStore::new());
        assert!(below.is_empty());

        let at = evaluate(&[line(&catalog, "A", 5)], &catalog, &ChoiceStore::new());
        assert_eq!(at.len(), 1);
        assert!(at[0].is_order_gift());
        assert_eq!(at[0].quantity, 1);
        assert_eq!(at[0].scheme_id, Some(4));

        let above = evaluate(&[line(&catalog, "A", 50)], &catalog, &ChoiceStore::new());
        assert_eq!(above.iter().filter(|l| l.is_order_gift()).count(), 1);
    }

    #[test]
    fn test_free_lines_do_not_count_toward_threshold() {
        let catalog = CatalogSnapshot::new(
            vec![with_scheme(product("A", 1000), 1, 1, 10, None), product("GIFT", 0)],
            vec![order_scheme(5000, "GIFT")],
        );
        let free = evaluate(&[line(&catalog, "A", 4)], &catalog, &ChoiceStore::new());

        assert_eq!(free.len(), 1);
        assert!(!free[0].is_order_gift());
    }

    #[test]
    fn test_empty_catalog_grants_nothing() {
        let scheme_product = with_scheme(product("A", 100), 1, 1, 1, None);
        let regular = vec![OrderLine::regular(&scheme_product, 10)];

        assert!(evaluate(&regular, &CatalogSnapshot::empty(), &ChoiceStore::new()).is_empty());
    }

    #[test]
    fn test_empty_order_earns_no_gift() {
        let catalog = CatalogSnapshot::new(vec![product("GIFT", 0)], vec![order_scheme(0, "GIFT")]);
        assert!(evaluate(&[], &catalog, &ChoiceStore::new()).is_empty());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let catalog = CatalogSnapshot::new(
            vec![
                with_scheme(product("A", 100), 3, 2, 1, Some("B")),
                product("B", 50),
                product("GIFT", 0),
            ],
            vec![order_scheme(500, "GIFT")],
        );
        let mut lines = LineItemSet::new();
        lines.push_regular(line(&catalog, "A", 6));

        let once = apply(&lines, &catalog, &ChoiceStore::new());
        let twice = apply(&once, &catalog, &ChoiceStore::new());

        assert_eq!(once, twice);
        assert_eq!(once.free().len(), 3);
        assert_eq!(once.regular(), lines.regular());
    }
}
