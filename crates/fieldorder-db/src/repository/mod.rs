//! # Repository Module
//!
//! Database repository implementations for field orders.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Order screen                                                          │
//! │       │                                                                 │
//! │       │  db.catalog().load_snapshot()                                  │
//! │       │  db.orders().save_checkout(&order, &payload)                   │
//! │       ▼                                                                 │
//! │  CatalogRepository              OrderRepository                        │
//! │  ├── upsert_product             ├── save_checkout                      │
//! │  ├── insert_scheme              ├── replace_checkout                   │
//! │  ├── active_products            ├── get_order / get_lines              │
//! │  ├── active_schemes             ├── get_choices / get_payload          │
//! │  └── load_snapshot              └── load_session                       │
//! │       │                                │                                │
//! │       └──────────────┬─────────────────┘                                │
//! │                      ▼                                                  │
//! │               SQLite Database                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Products and scheme records
//! - [`order::OrderRepository`] - Submitted orders, lines and choices

pub mod catalog;
pub mod order;
