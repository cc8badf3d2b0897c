//! # Order Session
//!
//! The mutation API for one shop visit's order.
//!
//! ## Every Action Re-Evaluates Everything
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  User Action           Session Call          Regular Lines              │
//! │  ───────────           ────────────          ─────────────              │
//! │  Tap +        ───────► increment()   ──────► qty += 1 / insert qty 1    │
//! │  Tap -        ───────► decrement()   ──────► qty -= 1 / remove at 1     │
//! │  Pick bonus   ───────► set_choice()  ──────► (unchanged)                │
//! │  Catalog loads ──────► replace_catalog() ──► (unchanged)                │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                  evaluator::evaluate(all regular lines)                 │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                        free lines replaced wholesale                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calls are synchronous and complete before the next one is accepted; the
//! session holds no locks and spawns nothing. A host that shares a session
//! across threads wraps it itself.

use tracing::debug;

use crate::catalog::{CatalogSnapshot, Product};
use crate::checkout::{regular_lines_from_history, CheckoutPayload};
use crate::choice::{ChoiceStore, SchemeChoice};
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::evaluator;
use crate::line::{LineItemSet, OrderLine};
use crate::summary::OrderSummary;
use crate::validation::{validate_line_count, validate_product_id, validate_quantity};

/// State for one order: catalog snapshot, choices and lines.
#[derive(Debug, Clone)]
pub struct OrderSession {
    catalog: CatalogSnapshot,
    choices: ChoiceStore,
    lines: LineItemSet,
    config: EngineConfig,
}

impl OrderSession {
    /// Starts an empty order against `catalog`.
    pub fn new(catalog: CatalogSnapshot, config: EngineConfig) -> Self {
        OrderSession {
            catalog,
            choices: ChoiceStore::new(),
            lines: LineItemSet::new(),
            config,
        }
    }

    /// Seeds an edit session from a stored order.
    ///
    /// Only regular rows are kept; bonuses are regenerated against the given
    /// catalog and choices. Products with no recorded choice get the default,
    /// never one inferred from the stored free rows.
    ///
    /// The stored order is brought within `config`: quantities are clamped to
    /// `max_item_quantity` and lines past `max_line_items` are dropped, so
    /// every later mutation starts from a state the limits allow.
    pub fn from_history(
        catalog: CatalogSnapshot,
        history: &[OrderLine],
        choices: ChoiceStore,
        config: EngineConfig,
    ) -> Self {
        let mut lines = LineItemSet::new();
        for mut line in regular_lines_from_history(history) {
            if lines.regular().len() >= config.max_line_items {
                debug!(
                    product_id = %line.product_id,
                    max = config.max_line_items,
                    "Dropping stored line over the line limit"
                );
                continue;
            }
            if line.quantity > config.max_item_quantity {
                debug!(
                    product_id = %line.product_id,
                    stored = line.quantity,
                    max = config.max_item_quantity,
                    "Clamping stored quantity to the item limit"
                );
                line.set_quantity(config.max_item_quantity);
            }
            lines.push_regular(line);
        }

        debug!(
            rows = history.len(),
            regular = lines.regular().len(),
            "Seeding order session from history"
        );

        let mut session = OrderSession {
            catalog,
            choices,
            lines,
            config,
        };
        session.reevaluate();
        session
    }

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    pub fn choices(&self) -> &ChoiceStore {
        &self.choices
    }

    pub fn lines(&self) -> &LineItemSet {
        &self.lines
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current regular quantity of a product (0 when absent).
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.lines
            .regular_line(product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.regular().is_empty()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of `product`.
    ///
    /// The first increment inserts a line with the product's unit price
    /// frozen; later increments reuse that price.
    pub fn increment(&mut self, product: &Product) -> CoreResult<()> {
        validate_product_id(&product.id)?;

        let existing = self.lines.regular_line(&product.id).map(|l| l.quantity);
        match existing {
            Some(quantity) => {
                let requested = quantity.saturating_add(1);
                self.check_quantity(requested)?;
                if let Some(line) = self.lines.regular_line_mut(&product.id) {
                    line.set_quantity(requested);
                }
            }
            None => {
                validate_line_count(self.lines.regular().len(), self.config.max_line_items)
                    .map_err(|_| CoreError::TooManyLines {
                        max: self.config.max_line_items,
                    })?;
                self.check_quantity(1)?;
                self.lines.push_regular(OrderLine::regular(product, 1));
            }
        }

        debug!(
            product_id = %product.id,
            quantity = self.quantity_of(&product.id),
            "Incremented line"
        );

        self.reevaluate();
        Ok(())
    }

    /// Adds one unit of a product by id.
    ///
    /// An existing line is bumped even if the product has since left the
    /// catalog; a new line needs the product in the current snapshot.
    pub fn increment_by_id(&mut self, product_id: &str) -> CoreResult<()> {
        validate_product_id(product_id)?;

        let product = match self.catalog.product(product_id) {
            Some(product) => product.clone(),
            None => {
                let line = self
                    .lines
                    .regular_line(product_id)
                    .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
                product_from_line(line)
            }
        };

        self.increment(&product)
    }

    /// Removes one unit; a line at quantity 1 is removed entirely.
    pub fn decrement(&mut self, product_id: &str) -> CoreResult<()> {
        let current = self
            .lines
            .regular_line(product_id)
            .map(|l| l.quantity)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;

        if current > 1 {
            let quantity = current - 1;
            if let Some(line) = self.lines.regular_line_mut(product_id) {
                line.set_quantity(quantity);
            }
            debug!(product_id = %product_id, quantity, "Decremented line");
        } else {
            self.lines.remove_regular(product_id);
            debug!(product_id = %product_id, "Removed line at zero");
        }

        self.reevaluate();
        Ok(())
    }

    /// Removes a product's line regardless of its quantity.
    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        self.lines
            .remove_regular(product_id)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;

        debug!(product_id = %product_id, "Removed line");

        self.reevaluate();
        Ok(())
    }

    /// Records the bonus alternative for an either/or product.
    ///
    /// Regular lines are untouched. The choice is kept even if the product
    /// is not currently in the order.
    pub fn set_choice(&mut self, product_id: &str, choice: SchemeChoice) -> CoreResult<()> {
        validate_product_id(product_id)?;

        let previous = self.choices.set(product_id, choice);
        debug!(
            product_id = %product_id,
            from = previous.as_str(),
            to = choice.as_str(),
            "Scheme choice changed"
        );

        self.reevaluate();
        Ok(())
    }

    /// Installs a freshly fetched catalog and re-evaluates.
    ///
    /// Lines added while the catalog was still empty pick up their bonuses
    /// here.
    pub fn replace_catalog(&mut self, catalog: CatalogSnapshot) {
        debug!(products = catalog.product_count(), "Catalog replaced");
        self.catalog = catalog;
        self.reevaluate();
    }

    /// Empties the order. Choices are kept.
    pub fn clear(&mut self) {
        self.lines.clear();
        debug!("Order cleared");
        self.reevaluate();
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    pub fn summary(&self) -> OrderSummary {
        OrderSummary::compute(&self.lines, &self.catalog)
    }

    /// Builds the payload for the persistence collaborator.
    pub fn checkout(&self) -> CoreResult<CheckoutPayload> {
        if self.is_empty() {
            return Err(ValidationError::Required {
                field: "order lines".to_string(),
            }
            .into());
        }

        Ok(CheckoutPayload::build(
            &self.lines,
            self.choices.to_map(),
            self.summary(),
        ))
    }

    fn check_quantity(&self, requested: i64) -> CoreResult<()> {
        let max = self.config.max_item_quantity;
        validate_quantity(requested, max).map_err(|_| CoreError::QuantityTooLarge { requested, max })
    }

    fn reevaluate(&mut self) {
        let free = evaluator::evaluate(self.lines.regular(), &self.catalog, &self.choices);
        self.lines.replace_free(free);
    }
}

/// Minimal product record reconstructed from a line, used to bump a line
/// whose product is missing from the snapshot. Only id and price matter
/// because the line already exists.
fn product_from_line(line: &OrderLine) -> Product {
    Product {
        id: line.product_id.clone(),
        name: line.name.clone(),
        category: line.category.clone(),
        list_price_cents: line.unit_price_cents,
        trade_price_cents: None,
        unit: line.unit.clone(),
        scheme_id: None,
        buy_qty: 0,
        get_qty: 0,
        offer_product_id: None,
        offer_product_name: None,
        is_active: true,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
