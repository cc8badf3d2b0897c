//! # fieldorder-db: Database Layer for Field Orders
//!
//! SQLite storage for the product catalog and submitted orders, using sqlx
//! for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Field Order Data Flow                            │
//! │                                                                         │
//! │  OrderSession (fieldorder-core)                                        │
//! │       │  checkout() → CheckoutPayload                                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  fieldorder-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog and order repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fieldorder_core::{EngineConfig, OrderSession};
//! use fieldorder_db::{Database, DbConfig, NewOrder};
//!
//! let db = Database::new(DbConfig::new("fieldorder.db")).await?;
//!
//! let catalog = db.catalog().load_snapshot().await?;
//! let mut session = OrderSession::new(catalog, EngineConfig::from_env());
//! session.increment_by_id("COLA-1L")?;
//!
//! let record = db
//!     .orders()
//!     .save_checkout(&NewOrder::for_shop("SHOP-42"), &session.checkout()?)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::catalog::CatalogRepository;
pub use repository::order::{NewOrder, OrderRecord, OrderRepository, OrderStatus};
