//! # fieldorder-core: Order & Promotion Pricing Engine
//!
//! Pure order logic for a field-sales shop visit: the line items of the
//! order, the bonus lines derived from promotional schemes, and the totals
//! shown on the order screen.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shop Visit Screens                               │
//! │      Product list ──► +/- taps ──► bonus picker ──► Submit order       │
//! └─────────────────────────────────┬───────────────────────────────────────┘
//!                                   │
//! ┌─────────────────────────────────▼───────────────────────────────────────┐
//! │              ★ fieldorder-core (THIS CRATE) ★                           │
//! │                                                                         │
//! │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐ │
//! │  │  catalog  │ │  choice   │ │   line    │ │ evaluator │ │  session  │ │
//! │  │ Product   │ │ Choice    │ │ OrderLine │ │ evaluate  │ │ increment │ │
//! │  │ Scheme    │ │ Store     │ │ LineItem  │ │ apply     │ │ decrement │ │
//! │  │ Snapshot  │ │           │ │ Set       │ │           │ │ setChoice │ │
//! │  └───────────┘ └───────────┘ └───────────┘ └───────────┘ └───────────┘ │
//! │        summary (totals)  ·  checkout (payload)  ·  money  ·  validation │
//! │                                                                         │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS                    │
//! └─────────────────────────────────┬───────────────────────────────────────┘
//!                                   │ CheckoutPayload
//! ┌─────────────────────────────────▼───────────────────────────────────────┐
//! │                fieldorder-db (SQLite persistence)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use fieldorder_core::{CatalogSnapshot, EngineConfig, OrderSession, Product, SchemeChoice};
//!
//! let product = |id: &str, scheme: Option<i64>| Product {
//!     id: id.to_string(),
//!     name: id.to_string(),
//!     category: None,
//!     list_price_cents: 500,
//!     trade_price_cents: None,
//!     unit: None,
//!     scheme_id: scheme,
//!     buy_qty: 3,
//!     get_qty: 1,
//!     offer_product_id: Some("B".to_string()),
//!     offer_product_name: None,
//!     is_active: true,
//! };
//!
//! let catalog = CatalogSnapshot::new(vec![product("A", Some(2)), product("B", None)], vec![]);
//! let mut order = OrderSession::new(catalog, EngineConfig::default());
//!
//! for _ in 0..3 {
//!     order.increment_by_id("A").unwrap();
//! }
//! assert_eq!(order.lines().free()[0].product_id, "A");
//!
//! order.set_choice("A", SchemeChoice::OfferProduct).unwrap();
//! assert_eq!(order.lines().free()[0].product_id, "B");
//! assert_eq!(order.summary().subtotal_cents, 1500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod checkout;
pub mod choice;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod line;
pub mod money;
pub mod session;
pub mod summary;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{CatalogSnapshot, Product, Scheme, SchemeKind, SchemeScope};
pub use checkout::{CheckoutLine, CheckoutPayload};
pub use choice::{ChoiceStore, SchemeChoice};
pub use config::EngineConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use line::{LineItemSet, OrderLine};
pub use money::Money;
pub use session::OrderSession;
pub use summary::{OrderSummary, ThresholdProgress};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default ceiling on distinct products in one order.
pub const MAX_LINE_ITEMS: usize = 100;

/// Default ceiling on the quantity of a single line.
///
/// Guards against fat-fingered quantities (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
