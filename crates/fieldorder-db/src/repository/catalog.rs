//! # Catalog Repository
//!
//! Database operations for products and scheme records.
//!
//! ## Snapshot Loading
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How the Order Screen Gets a Catalog                  │
//! │                                                                         │
//! │  load_snapshot()                                                       │
//! │       │                                                                 │
//! │       ├── active_products()   products p                               │
//! │       │                       LEFT JOIN products o                     │
//! │       │                         ON o.id = p.offer_product_id           │
//! │       │                       → offer_product_name for display         │
//! │       │                                                                 │
//! │       └── active_schemes()    schemes WHERE is_active = 1              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CatalogSnapshot::new(products, schemes)                               │
//! │  (immutable; swapped into the session with replace_catalog)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The offer product is joined, not enforced: a dangling `offer_product_id`
//! loads with a `NULL` name and the evaluator skips that bonus.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use fieldorder_core::{CatalogSnapshot, Product, Scheme};

/// Shared projection for product reads.
const PRODUCT_COLUMNS: &str = r#"
    p.id,
    p.name,
    p.category,
    p.list_price_cents,
    p.trade_price_cents,
    p.unit,
    p.scheme_id,
    p.buy_qty,
    p.get_qty,
    p.offer_product_id,
    o.name AS offer_product_name,
    p.is_active
"#;

/// Repository for catalog database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CatalogRepository::new(pool);
/// let snapshot = repo.load_snapshot().await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts or replaces a product.
    ///
    /// `offer_product_name` is ignored: it is always derived from the
    /// referenced product on read.
    pub async fn upsert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, scheme_id = ?product.scheme_id, "Upserting product");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, list_price_cents, trade_price_cents, unit,
                scheme_id, buy_qty, get_qty, offer_product_id, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                list_price_cents = excluded.list_price_cents,
                trade_price_cents = excluded.trade_price_cents,
                unit = excluded.unit,
                scheme_id = excluded.scheme_id,
                buy_qty = excluded.buy_qty,
                get_qty = excluded.get_qty,
                offer_product_id = excluded.offer_product_id,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.list_price_cents)
        .bind(product.trade_price_cents)
        .bind(&product.unit)
        .bind(product.scheme_id)
        .bind(product.buy_qty)
        .bind(product.get_qty)
        .bind(&product.offer_product_id)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a scheme record, returning its row id.
    pub async fn insert_scheme(&self, scheme: &Scheme) -> DbResult<i64> {
        debug!(scheme_id = scheme.scheme_id, scope = ?scheme.scope, "Inserting scheme");

        let result = sqlx::query(
            r#"
            INSERT INTO schemes (
                scheme_id, scope, min_price_cents, description, gift_product_id, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(scheme.scheme_id)
        .bind(scheme.scope)
        .bind(scheme.min_price_cents)
        .bind(&scheme.description)
        .bind(&scheme.gift_product_id)
        .bind(scheme.is_active)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Gets a product by id, active or not.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             LEFT JOIN products o ON o.id = p.offer_product_id \
             WHERE p.id = ?1"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products ordered by name.
    pub async fn active_products(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             LEFT JOIN products o ON o.id = p.offer_product_id \
             WHERE p.is_active = 1 \
             ORDER BY p.name, p.id"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists active scheme records in insertion order.
    ///
    /// Insertion order matters: the first active order-scope record is the
    /// one the engine applies.
    pub async fn active_schemes(&self) -> DbResult<Vec<Scheme>> {
        let schemes = sqlx::query_as::<_, Scheme>(
            r#"
            SELECT scheme_id, scope, min_price_cents, description, gift_product_id, is_active
            FROM schemes
            WHERE is_active = 1
            ORDER BY row_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(schemes)
    }

    /// Activates or deactivates a product. Returns false if no such product.
    pub async fn set_product_active(&self, id: &str, active: bool) -> DbResult<bool> {
        debug!(id = %id, active, "Setting product active flag");

        let result = sqlx::query("UPDATE products SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all products, active or not.
    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Loads the active catalog as an immutable snapshot.
    pub async fn load_snapshot(&self) -> DbResult<CatalogSnapshot> {
        let products = self.active_products().await?;
        let schemes = self.active_schemes().await?;

        info!(
            products = products.len(),
            schemes = schemes.len(),
            "Catalog snapshot loaded"
        );

        Ok(CatalogSnapshot::new(products, schemes))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use fieldorder_core::{SchemeKind, SchemeScope};

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: Some("Beverages".to_string()),
            list_price_cents: price,
            trade_price_cents: None,
            unit: Some("carton".to_string()),
            scheme_id: None,
            buy_qty: 0,
            get_qty: 0,
            offer_product_id: None,
            offer_product_name: None,
            is_active: true,
        }
    }

    async fn repo() -> CatalogRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog()
    }

    #[tokio::test]
    async fn test_upsert_and_get_product() {
        let repo = repo().await;

        let mut cola = product("COLA", 450);
        cola.trade_price_cents = Some(400);
        repo.upsert_product(&cola).await.unwrap();

        let loaded = repo.get_product("COLA").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Product COLA");
        assert_eq!(loaded.trade_price_cents, Some(400));
        assert_eq!(loaded.unit_price().cents(), 400);

        cola.name = "Cola 1.5L".to_string();
        repo.upsert_product(&cola).await.unwrap();
        let loaded = repo.get_product("COLA").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Cola 1.5L");
        assert_eq!(repo.count_products().await.unwrap(), 1);

        assert!(repo.get_product("MISSING").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offer_product_name_is_joined() {
        let repo = repo().await;

        let mut a = product("A", 500);
        a.scheme_id = Some(2);
        a.buy_qty = 6;
        a.get_qty = 1;
        a.offer_product_id = Some("B".to_string());
        repo.upsert_product(&a).await.unwrap();
        repo.upsert_product(&product("B", 200)).await.unwrap();

        let mut dangling = product("C", 300);
        dangling.scheme_id = Some(3);
        dangling.offer_product_id = Some("GONE".to_string());
        repo.upsert_product(&dangling).await.unwrap();

        let a = repo.get_product("A").await.unwrap().unwrap();
        assert_eq!(a.offer_product_name.as_deref(), Some("Product B"));
        assert_eq!(a.scheme_kind(), Some(SchemeKind::BuyGetEitherOr));

        let c = repo.get_product("C").await.unwrap().unwrap();
        assert_eq!(c.offer_product_id.as_deref(), Some("GONE"));
        assert!(c.offer_product_name.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_excludes_inactive() {
        let repo = repo().await;

        repo.upsert_product(&product("A", 100)).await.unwrap();
        repo.upsert_product(&product("B", 100)).await.unwrap();
        assert!(repo.set_product_active("B", false).await.unwrap());
        assert!(!repo.set_product_active("NOPE", false).await.unwrap());

        repo.insert_scheme(&Scheme {
            scheme_id: 4,
            scope: SchemeScope::Order,
            min_price_cents: Some(10_000),
            description: Some("Spend 100, get a gift".to_string()),
            gift_product_id: Some("A".to_string()),
            is_active: true,
        })
        .await
        .unwrap();
        repo.insert_scheme(&Scheme {
            scheme_id: 4,
            scope: SchemeScope::Order,
            min_price_cents: Some(1),
            description: None,
            gift_product_id: None,
            is_active: false,
        })
        .await
        .unwrap();

        let snapshot = repo.load_snapshot().await.unwrap();
        assert_eq!(snapshot.product_count(), 1);
        assert!(snapshot.product("A").is_some());
        assert!(snapshot.product("B").is_none());
        assert_eq!(snapshot.schemes().len(), 1);

        let threshold = snapshot.order_threshold().unwrap();
        assert_eq!(threshold.min_price.cents(), 10_000);
        assert_eq!(threshold.gift_product_id, Some("A"));
    }
}
