//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and one sample order.
//!
//! ## Usage
//! ```bash
//! # Seed ./fieldorder_dev.db
//! cargo run -p fieldorder-db --bin seed
//!
//! # Specify database path
//! cargo run -p fieldorder-db --bin seed -- --db ./data/fieldorder.db
//!
//! # Verbose engine logs
//! RUST_LOG=debug cargo run -p fieldorder-db --bin seed
//! ```
//!
//! ## Generated Catalog
//! One product per scheme kind so every bonus path shows up in the sample:
//! - Kind 1: buy N get M of the same product
//! - Kind 2: buy N, pick same-product units OR the offer product
//! - Kind 3: buy N, get both
//! - Kind 4: order-level gift once the subtotal passes a threshold

use std::env;

use fieldorder_core::{
    EngineConfig, OrderSession, Product, Scheme, SchemeChoice, SchemeScope,
};
use fieldorder_db::{Database, DbConfig, NewOrder};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// (id, name, category, unit, list price, trade price, scheme, buy, get, offer)
type ProductRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    i64,
    Option<i64>,
    Option<i64>,
    i64,
    i64,
    Option<&'static str>,
);

const PRODUCTS: &[ProductRow] = &[
    ("BEV-COLA-1L", "Cola 1L", "Beverages", "carton", 1_200, Some(1_050), Some(1), 10, 1, None),
    ("BEV-LIME-1L", "Lime Soda 1L", "Beverages", "carton", 1_100, None, Some(2), 6, 1, Some("SNK-CHIPS-S")),
    ("DRY-TEA-250", "Black Tea 250g", "Grocery", "pack", 450, Some(420), Some(3), 12, 2, Some("GFT-MUG")),
    ("DRY-SUGAR-1K", "Sugar 1kg", "Grocery", "bag", 180, None, None, 0, 0, None),
    ("SNK-CHIPS-S", "Potato Chips Small", "Snacks", "pcs", 60, None, None, 0, 0, None),
    ("GFT-MUG", "Branded Mug", "Gifts", "pcs", 0, None, None, 0, 0, None),
    ("GFT-CAP", "Branded Cap", "Gifts", "pcs", 0, None, None, 0, 0, None),
];

/// Order-level gift threshold: 250.00
const GIFT_THRESHOLD_CENTS: i64 = 25_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fieldorder_core=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./fieldorder_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Field Order Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./fieldorder_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Field Order Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let catalog_repo = db.catalog();
    let existing = catalog_repo.count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog seed to avoid duplicates.");
    } else {
        for row in PRODUCTS {
            catalog_repo.upsert_product(&product_from_row(row)).await?;
        }
        catalog_repo
            .insert_scheme(&Scheme {
                scheme_id: 4,
                scope: SchemeScope::Order,
                min_price_cents: Some(GIFT_THRESHOLD_CENTS),
                description: Some("Orders over 250.00 get a branded cap".to_string()),
                gift_product_id: Some("GFT-CAP".to_string()),
                is_active: true,
            })
            .await?;
        println!("✓ Inserted {} products and 1 order scheme", PRODUCTS.len());
    }

    // Walk a sample visit through the engine and store it.
    let catalog = catalog_repo.load_snapshot().await?;

    println!();
    println!("Catalog ({} active products)", catalog.product_count());
    for product in catalog.products_sorted() {
        println!(
            "  {:<10} {:<22} {:>10}",
            product.category.as_deref().unwrap_or("-"),
            product.name,
            product.unit_price().to_string()
        );
    }

    let mut session = OrderSession::new(catalog, EngineConfig::from_env());

    for _ in 0..10 {
        session.increment_by_id("BEV-COLA-1L")?;
    }
    for _ in 0..6 {
        session.increment_by_id("BEV-LIME-1L")?;
    }
    session.set_choice("BEV-LIME-1L", SchemeChoice::OfferProduct)?;
    for _ in 0..12 {
        session.increment_by_id("DRY-TEA-250")?;
    }
    for _ in 0..20 {
        session.increment_by_id("DRY-SUGAR-1K")?;
    }

    let payload = session.checkout()?;
    let order = NewOrder {
        shop_id: "SHOP-DEMO-001".to_string(),
        visit_id: Some("VISIT-DEMO-001".to_string()),
        salesperson_id: Some("REP-001".to_string()),
    };
    let record = db.orders().save_checkout(&order, &payload).await?;

    info!(order_id = %record.id, "Sample order stored");

    println!();
    println!("Sample order {}", record.id);
    for line in payload.persisted_lines() {
        let marker = if line.is_free { "FREE" } else { "    " };
        println!(
            "  {} {:<22} x{:<4} {:>10}",
            marker,
            line.name,
            line.quantity,
            line.amount().to_string()
        );
    }
    println!("  Subtotal: {}", record.subtotal());
    if let Some(threshold) = payload.summary.threshold {
        if threshold.met {
            println!("  Order gift threshold met");
        } else {
            println!("  {} cents short of the order gift", threshold.remaining_cents);
        }
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn product_from_row(row: &ProductRow) -> Product {
    let (id, name, category, unit, list, trade, scheme_id, buy_qty, get_qty, offer) = *row;

    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: Some(category.to_string()),
        list_price_cents: list,
        trade_price_cents: trade,
        unit: Some(unit.to_string()),
        scheme_id,
        buy_qty,
        get_qty,
        offer_product_id: offer.map(str::to_string),
        // Derived from the offer product on read.
        offer_product_name: None,
        is_active: true,
    }
}
