//! # Order Repository
//!
//! Database operations for submitted orders, their lines and bonus choices.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. SUBMIT                                                             │
//! │     └── save_checkout(new_order, payload)                              │
//! │         ├── INSERT orders         (header + payload_json snapshot)     │
//! │         ├── INSERT order_lines    (regular, bonuses, gift; in order)   │
//! │         └── INSERT order_choices  (either/or picks)                    │
//! │         all in ONE transaction                                         │
//! │                                                                         │
//! │  2. EDIT                                                               │
//! │     └── load_session(id, catalog, config) → OrderSession               │
//! │         (regular lines + stored choices; bonuses regenerated)          │
//! │                                                                         │
//! │  3. RESUBMIT                                                           │
//! │     └── replace_checkout(id, payload) → status = edited                │
//! │         (lines and choices replaced wholesale, same transaction)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored free rows are kept for display and audit only. An edit session
//! never reads them back: bonuses are always recomputed, and the either/or
//! pick comes from `order_choices`, not from which free row happens to exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fieldorder_core::{
    CatalogSnapshot, CheckoutPayload, ChoiceStore, EngineConfig, Money, OrderLine, OrderSession,
    SchemeChoice,
};

// =============================================================================
// Records
// =============================================================================

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Submitted,
    /// Resubmitted from an edit session.
    Edited,
}

/// Who and where an order is taken for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub shop_id: String,
    pub visit_id: Option<String>,
    pub salesperson_id: Option<String>,
}

impl NewOrder {
    pub fn for_shop(shop_id: impl Into<String>) -> Self {
        NewOrder {
            shop_id: shop_id.into(),
            ..NewOrder::default()
        }
    }
}

/// Order header row. Totals are copied from the checkout summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    pub shop_id: String,
    pub visit_id: Option<String>,
    pub salesperson_id: Option<String>,
    pub status: OrderStatus,
    pub line_count: i64,
    pub item_count: i64,
    pub free_item_count: i64,
    pub subtotal_cents: i64,
    pub has_free_items: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

const ORDER_COLUMNS: &str = r#"
    id, shop_id, visit_id, salesperson_id, status,
    line_count, item_count, free_item_count, subtotal_cents, has_free_items,
    created_at, updated_at
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Stores a submitted order.
    ///
    /// Header, lines and choices are written in one transaction: either the
    /// whole order lands or nothing does.
    pub async fn save_checkout(
        &self,
        order: &NewOrder,
        payload: &CheckoutPayload,
    ) -> DbResult<OrderRecord> {
        let now = Utc::now();
        let record = OrderRecord {
            id: Uuid::new_v4().to_string(),
            shop_id: order.shop_id.clone(),
            visit_id: order.visit_id.clone(),
            salesperson_id: order.salesperson_id.clone(),
            status: OrderStatus::Submitted,
            line_count: payload.summary.line_count as i64,
            item_count: payload.summary.item_count,
            free_item_count: payload.summary.free_item_count,
            subtotal_cents: payload.summary.subtotal_cents,
            has_free_items: payload.summary.has_free_items,
            created_at: now,
            updated_at: now,
        };
        let payload_json = payload.to_json()?;

        debug!(
            id = %record.id,
            shop_id = %record.shop_id,
            subtotal_cents = record.subtotal_cents,
            "Saving order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, shop_id, visit_id, salesperson_id, status,
                line_count, item_count, free_item_count, subtotal_cents, has_free_items,
                payload_json, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&record.id)
        .bind(&record.shop_id)
        .bind(&record.visit_id)
        .bind(&record.salesperson_id)
        .bind(record.status)
        .bind(record.line_count)
        .bind(record.item_count)
        .bind(record.free_item_count)
        .bind(record.subtotal_cents)
        .bind(record.has_free_items)
        .bind(&payload_json)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await?;

        write_lines_and_choices(&mut tx, &record.id, payload).await?;

        tx.commit().await?;

        info!(id = %record.id, lines = payload.persisted_lines().len(), "Order saved");
        Ok(record)
    }

    /// Replaces the contents of an existing order with a new checkout.
    ///
    /// The header keeps its id, shop and creation time; status becomes
    /// [`OrderStatus::Edited`].
    pub async fn replace_checkout(
        &self,
        order_id: &str,
        payload: &CheckoutPayload,
    ) -> DbResult<OrderRecord> {
        let payload_json = payload.to_json()?;
        let now = Utc::now();

        debug!(id = %order_id, "Replacing order contents");

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?1,
                line_count = ?2,
                item_count = ?3,
                free_item_count = ?4,
                subtotal_cents = ?5,
                has_free_items = ?6,
                payload_json = ?7,
                updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(OrderStatus::Edited)
        .bind(payload.summary.line_count as i64)
        .bind(payload.summary.item_count)
        .bind(payload.summary.free_item_count)
        .bind(payload.summary.subtotal_cents)
        .bind(payload.summary.has_free_items)
        .bind(&payload_json)
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        // Dropping tx without commit rolls back.
        if updated.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM order_choices WHERE order_id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        write_lines_and_choices(&mut tx, order_id, payload).await?;

        tx.commit().await?;

        info!(id = %order_id, "Order replaced");

        self.get_order(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    /// Gets an order header by id.
    pub async fn get_order(&self, id: &str) -> DbResult<Option<OrderRecord>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");

        let order = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Lists a shop's orders, newest first.
    pub async fn list_for_shop(&self, shop_id: &str) -> DbResult<Vec<OrderRecord>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE shop_id = ?1 ORDER BY created_at DESC, id"
        );

        let orders = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Gets the stored lines of an order in display order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT
                product_id, name, category, unit, quantity,
                unit_price_cents, amount_cents, is_free, free_gift_for, scheme_id
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets the recorded either/or choices of an order.
    pub async fn get_choices(&self, order_id: &str) -> DbResult<ChoiceStore> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT product_id, choice FROM order_choices WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let mut choices = ChoiceStore::new();
        for (product_id, choice) in rows {
            let choice =
                SchemeChoice::parse(&choice).map_err(|e| DbError::InvalidData(e.to_string()))?;
            choices.set(product_id, choice);
        }

        Ok(choices)
    }

    /// Gets the checkout snapshot stored with the order header.
    pub async fn get_payload(&self, order_id: &str) -> DbResult<Option<CheckoutPayload>> {
        let json: Option<String> =
            sqlx::query_scalar("SELECT payload_json FROM orders WHERE id = ?1")
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Opens an edit session for a stored order against a fresh catalog.
    pub async fn load_session(
        &self,
        order_id: &str,
        catalog: CatalogSnapshot,
        config: EngineConfig,
    ) -> DbResult<OrderSession> {
        if self.get_order(order_id).await?.is_none() {
            return Err(DbError::not_found("Order", order_id));
        }

        let history = self.get_lines(order_id).await?;
        let choices = self.get_choices(order_id).await?;

        debug!(
            id = %order_id,
            rows = history.len(),
            choices = choices.len(),
            "Loading order for edit"
        );

        Ok(OrderSession::from_history(catalog, &history, choices, config))
    }

    /// Deletes an order. Lines and choices cascade. Returns false if absent.
    pub async fn delete_order(&self, order_id: &str) -> DbResult<bool> {
        debug!(id = %order_id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Inserts the flattened lines and the choices of a checkout.
async fn write_lines_and_choices(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    payload: &CheckoutPayload,
) -> DbResult<()> {
    for (position, line) in payload.persisted_lines().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_lines (
                id, order_id, position, product_id, name, category, unit, quantity,
                unit_price_cents, amount_cents, is_free, free_gift_for, scheme_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(position as i64)
        .bind(&line.product_id)
        .bind(&line.name)
        .bind(&line.category)
        .bind(&line.unit)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.amount_cents)
        .bind(line.is_free)
        .bind(&line.free_gift_for)
        .bind(line.scheme_id)
        .execute(&mut **tx)
        .await?;
    }

    for (product_id, choice) in &payload.choices {
        sqlx::query("INSERT INTO order_choices (order_id, product_id, choice) VALUES (?1, ?2, ?3)")
            .bind(order_id)
            .bind(product_id)
            .bind(choice.as_str())
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use fieldorder_core::{Product, Scheme, SchemeScope};

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

    /// A: buy 3 get 1, either/or with B. C: no scheme. Gift G over 20.00.
    fn catalog() -> CatalogSnapshot {
        let mut a = product("A", 500);
        a.scheme_id = Some(2);
        a.buy_qty = 3;
        a.get_qty = 1;
        a.offer_product_id = Some("B".to_string());

        CatalogSnapshot::new(
            vec![a, product("B", 200), product("C", 300), product("G", 0)],
            vec![Scheme {
                scheme_id: 4,
                scope: SchemeScope::Order,
                min_price_cents: Some(2_000),
                description: None,
                gift_product_id: Some("G".to_string()),
                is_active: true,
            }],
        )
    }

    async fn setup() -> (Database, OrderRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        (db, repo)
    }

    fn session_with(a_qty: i64, choice: SchemeChoice) -> OrderSession {
        let mut session = OrderSession::new(catalog(), EngineConfig::default());
        for _ in 0..a_qty {
            session.increment_by_id("A").unwrap();
        }
        session.set_choice("A", choice).unwrap();
        session
    }

    #[tokio::test]
    async fn test_save_checkout_persists_everything() {
        let (_db, repo) = setup().await;

        // 6 x A = 30.00 → 2 units of B (offer choice) + gift G.
        let session = session_with(6, SchemeChoice::OfferProduct);
        let payload = session.checkout().unwrap();

        let record = repo
            .save_checkout(&NewOrder::for_shop("SHOP-1"), &payload)
            .await
            .unwrap();
        assert_eq!(record.status, OrderStatus::Submitted);
        assert_eq!(record.subtotal_cents, 3_000);
        assert!(record.has_free_items);

        let stored = repo.get_order(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.id, record.id);
        assert_eq!(stored.subtotal().cents(), 3_000);
        assert_eq!(stored.line_count, 1);
        assert_eq!(stored.item_count, 6);

        let lines = repo.get_lines(&record.id).await.unwrap();
        let shape: Vec<(&str, i64, bool)> = lines
            .iter()
            .map(|l| (l.product_id.as_str(), l.quantity, l.is_free))
            .collect();
        assert_eq!(shape, vec![("A", 6, false), ("B", 2, true), ("G", 1, true)]);
        assert_eq!(lines[1].free_gift_for.as_deref(), Some("A"));
        assert!(lines[2].is_order_gift());

        let choices = repo.get_choices(&record.id).await.unwrap();
        assert_eq!(choices.get("A"), SchemeChoice::OfferProduct);

        let snapshot = repo.get_payload(&record.id).await.unwrap().unwrap();
        assert_eq!(snapshot, payload);
    }

    #[tokio::test]
    async fn test_failed_save_writes_nothing() {
        let (_db, repo) = setup().await;

        let mut payload = session_with(3, SchemeChoice::FreeQuantity).checkout().unwrap();
        // quantity > 0 is enforced by the schema; break it on the second row.
        payload.lines[0].bonuses[0].quantity = 0;

        let result = repo.save_checkout(&NewOrder::for_shop("SHOP-1"), &payload).await;
        assert!(result.is_err());
        assert!(repo.list_for_shop("SHOP-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_session_uses_stored_choice() {
        let (_db, repo) = setup().await;

        let payload = session_with(3, SchemeChoice::OfferProduct).checkout().unwrap();
        let record = repo
            .save_checkout(&NewOrder::for_shop("SHOP-1"), &payload)
            .await
            .unwrap();

        let session = repo
            .load_session(&record.id, catalog(), EngineConfig::default())
            .await
            .unwrap();

        assert_eq!(session.quantity_of("A"), 3);
        assert_eq!(session.choices().get("A"), SchemeChoice::OfferProduct);
        let free: Vec<&str> = session.lines().free().iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(free, vec!["B"]);
    }

    #[tokio::test]
    async fn test_load_session_without_choice_defaults() {
        let (_db, repo) = setup().await;

        // Stored rows show an offer-product bonus, but no choice row exists.
        let mut payload = session_with(3, SchemeChoice::OfferProduct).checkout().unwrap();
        payload.choices.clear();
        let record = repo
            .save_checkout(&NewOrder::for_shop("SHOP-1"), &payload)
            .await
            .unwrap();

        let session = repo
            .load_session(&record.id, catalog(), EngineConfig::default())
            .await
            .unwrap();

        assert_eq!(session.choices().get("A"), SchemeChoice::FreeQuantity);
        assert_eq!(session.lines().free()[0].product_id, "A");
    }

    #[tokio::test]
    async fn test_replace_checkout() {
        let (_db, repo) = setup().await;

        let payload = session_with(6, SchemeChoice::OfferProduct).checkout().unwrap();
        let record = repo
            .save_checkout(&NewOrder::for_shop("SHOP-1"), &payload)
            .await
            .unwrap();

        let before = repo.get_order(&record.id).await.unwrap().unwrap();
        let mut session = repo
            .load_session(&record.id, catalog(), EngineConfig::default())
            .await
            .unwrap();
        session.decrement("A").unwrap();
        session.increment_by_id("C").unwrap();
        session.set_choice("A", SchemeChoice::FreeQuantity).unwrap();
        let edited = session.checkout().unwrap();

        let updated = repo.replace_checkout(&record.id, &edited).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Edited);
        assert_eq!(updated.created_at, before.created_at);
        assert_eq!(updated.subtotal_cents, 5 * 500 + 300);

        let lines = repo.get_lines(&record.id).await.unwrap();
        let shape: Vec<(&str, i64, bool)> = lines
            .iter()
            .map(|l| (l.product_id.as_str(), l.quantity, l.is_free))
            .collect();
        assert_eq!(
            shape,
            vec![("A", 5, false), ("A", 1, true), ("C", 1, false), ("G", 1, true)]
        );
        assert_eq!(
            repo.get_choices(&record.id).await.unwrap().get("A"),
            SchemeChoice::FreeQuantity
        );
    }

    #[tokio::test]
    async fn test_missing_order() {
        let (_db, repo) = setup().await;
        let payload = session_with(1, SchemeChoice::FreeQuantity).checkout().unwrap();

        let err = repo.replace_checkout("nope", &payload).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = repo
            .load_session("nope", catalog(), EngineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert!(repo.get_payload("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (db, repo) = setup().await;
        let payload = session_with(3, SchemeChoice::OfferProduct).checkout().unwrap();
        let record = repo
            .save_checkout(&NewOrder::for_shop("SHOP-1"), &payload)
            .await
            .unwrap();

        assert!(repo.delete_order(&record.id).await.unwrap());
        assert!(!repo.delete_order(&record.id).await.unwrap());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(repo.get_choices(&record.id).await.unwrap().is_empty());
    }
}
