use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    DamageTypeId, OrderId, PaymentMethodId, PhoneConditionId, PhoneEquipmentId, SalesPersonId,
    StoreId, TechnicianId,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    ChildTable, CostRecord, DownPaymentRecord, PasscodeRecord, RepairOrderRecord,
    RepairOrderStore, Result, StoreError,
};

/// Unique constraint backing store-scoped slug uniqueness.
const SLUG_CONSTRAINT: &str = "repair_orders_store_slug_key";

/// PostgreSQL-backed repair-order store.
#[derive(Clone)]
pub struct PostgresRepairOrderStore {
    pool: PgPool,
}

impl PostgresRepairOrderStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Writes the order row and every child collection inside `tx`.
    async fn insert_all(
        tx: &mut Transaction<'_, Postgres>,
        order: &RepairOrderRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO repair_orders (
                id, store_id, slug, created_at, customer_name, contact_phone_number,
                phone_type, color, sales_person_id, technician_id, imei,
                parts_not_checked_yet, passcode, is_pattern_locked,
                down_payment_amount, down_payment_method_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.store_id.as_uuid())
        .bind(&order.slug)
        .bind(order.created_at)
        .bind(&order.customer_name)
        .bind(&order.contact_phone_number)
        .bind(&order.phone_type)
        .bind(&order.color)
        .bind(order.sales_person_id.as_uuid())
        .bind(order.technician_id.as_uuid())
        .bind(&order.imei)
        .bind(&order.parts_not_checked_yet)
        .bind(order.passcode.as_ref().map(|p| p.value.clone()))
        .bind(order.passcode.as_ref().map(|p| p.is_pattern_locked))
        .bind(order.down_payment.as_ref().map(|d| d.amount))
        .bind(order.down_payment.as_ref().map(|d| d.payment_method_id.as_uuid()))
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(SLUG_CONSTRAINT)
            {
                return StoreError::SlugConflict {
                    store_id: order.store_id,
                    slug: order.slug.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        let order_id = order.id.as_uuid();
        Self::insert_values(tx, ChildTable::Damages, order_id, &order.damages).await?;
        Self::insert_values(
            tx,
            ChildTable::PhoneConditions,
            order_id,
            &order.phone_conditions,
        )
        .await?;
        Self::insert_values(
            tx,
            ChildTable::PhoneEquipments,
            order_id,
            &order.phone_equipments,
        )
        .await?;
        Self::insert_values(tx, ChildTable::Photos, order_id, &order.photos).await?;
        Self::insert_costs(tx, order_id, &order.costs).await?;

        Ok(())
    }

    /// Bulk-inserts one string-valued child collection.
    async fn insert_values(
        tx: &mut Transaction<'_, Postgres>,
        table: ChildTable,
        order_id: Uuid,
        values: &[String],
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} (repair_order_id, {}) ",
            table.table_name(),
            value_column(table)
        ));
        builder.push_values(values, |mut row, value| {
            row.push_bind(order_id).push_bind(value.clone());
        });

        let affected = builder.build().execute(&mut **tx).await?.rows_affected();
        ensure_row_count(table, values.len(), affected)
    }

    async fn insert_costs(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
        costs: &[CostRecord],
    ) -> Result<()> {
        if costs.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO repair_order_costs (id, repair_order_id, amount, reason, created_at) ",
        );
        builder.push_values(costs, |mut row, cost| {
            row.push_bind(cost.id)
                .push_bind(order_id)
                .push_bind(cost.amount)
                .push_bind(cost.reason.clone())
                .push_bind(cost.created_at);
        });

        let affected = builder.build().execute(&mut **tx).await?.rows_affected();
        ensure_row_count(ChildTable::Costs, costs.len(), affected)
    }

    async fn fetch_values(&self, table: ChildTable, order_id: Uuid) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE repair_order_id = $1 ORDER BY position ASC",
            value_column(table),
            table.table_name()
        );
        let values = sqlx::query_scalar::<_, String>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    async fn fetch_costs(&self, order_id: Uuid) -> Result<Vec<CostRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, amount, reason, created_at
            FROM repair_order_costs
            WHERE repair_order_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cost).collect()
    }

    fn row_to_cost(row: PgRow) -> Result<CostRecord> {
        Ok(CostRecord {
            id: row.try_get("id")?,
            amount: row.try_get("amount")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    async fn names_by_ids(
        &self,
        table: &str,
        store_id: StoreId,
        ids: Vec<Uuid>,
    ) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Names come back in the order the IDs were requested.
        let sql = format!(
            "SELECT name FROM {table} WHERE store_id = $1 AND id = ANY($2) \
             ORDER BY array_position($2, id)"
        );
        let names = sqlx::query_scalar::<_, String>(&sql)
            .bind(store_id.as_uuid())
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn exists_in_store(&self, table: &str, store_id: StoreId, id: Uuid) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE store_id = $1 AND id = $2)");
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(store_id.as_uuid())
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    fn row_to_order(row: PgRow) -> Result<RepairOrderRecord> {
        let passcode = match (
            row.try_get::<Option<String>, _>("passcode")?,
            row.try_get::<Option<bool>, _>("is_pattern_locked")?,
        ) {
            (Some(value), locked) => Some(PasscodeRecord {
                value,
                is_pattern_locked: locked.unwrap_or(false),
            }),
            (None, _) => None,
        };

        let down_payment = match (
            row.try_get::<Option<i64>, _>("down_payment_amount")?,
            row.try_get::<Option<Uuid>, _>("down_payment_method_id")?,
        ) {
            (Some(amount), Some(method)) => Some(DownPaymentRecord {
                amount,
                payment_method_id: PaymentMethodId::from_uuid(method),
            }),
            _ => None,
        };

        Ok(RepairOrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            store_id: StoreId::from_uuid(row.try_get::<Uuid, _>("store_id")?),
            slug: row.try_get("slug")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            customer_name: row.try_get("customer_name")?,
            contact_phone_number: row.try_get("contact_phone_number")?,
            phone_type: row.try_get("phone_type")?,
            color: row.try_get("color")?,
            sales_person_id: SalesPersonId::from_uuid(row.try_get::<Uuid, _>("sales_person_id")?),
            technician_id: TechnicianId::from_uuid(row.try_get::<Uuid, _>("technician_id")?),
            imei: row.try_get("imei")?,
            parts_not_checked_yet: row.try_get("parts_not_checked_yet")?,
            passcode,
            down_payment,
            damages: Vec::new(),
            phone_conditions: Vec::new(),
            phone_equipments: Vec::new(),
            photos: Vec::new(),
            costs: Vec::new(),
        })
    }
}

fn value_column(table: ChildTable) -> &'static str {
    match table {
        ChildTable::Photos => "url",
        _ => "name",
    }
}

fn ensure_row_count(table: ChildTable, expected: usize, actual: u64) -> Result<()> {
    let expected = expected as u64;
    if actual != expected {
        return Err(StoreError::RowCountMismatch {
            table,
            expected,
            actual,
        });
    }
    Ok(())
}

#[async_trait]
impl RepairOrderStore for PostgresRepairOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, store_id = %order.store_id))]
    async fn create_repair_order(&self, order: &RepairOrderRecord) -> Result<()> {
        // A transaction dropped without commit (early return or panic) is
        // rolled back by sqlx when the connection returns to the pool.
        let mut tx = self.pool.begin().await?;

        match Self::insert_all(&mut tx, order).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => {
                metrics::counter!("repair_order_store_rollbacks_total").increment(1);
                if let Err(rollback_err) = tx.rollback().await {
                    // The connection may already have closed the transaction.
                    tracing::warn!(error = %rollback_err, "rollback after failed insert was a no-op");
                }
                Err(e)
            }
        }
    }

    async fn find_repair_order(
        &self,
        store_id: StoreId,
        order_id: OrderId,
    ) -> Result<Option<RepairOrderRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, store_id, slug, created_at, customer_name, contact_phone_number,
                   phone_type, color, sales_person_id, technician_id, imei,
                   parts_not_checked_yet, passcode, is_pattern_locked,
                   down_payment_amount, down_payment_method_id
            FROM repair_orders
            WHERE store_id = $1 AND id = $2
            "#,
        )
        .bind(store_id.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut order = Self::row_to_order(row)?;
        let id = order_id.as_uuid();
        order.damages = self.fetch_values(ChildTable::Damages, id).await?;
        order.phone_conditions = self.fetch_values(ChildTable::PhoneConditions, id).await?;
        order.phone_equipments = self.fetch_values(ChildTable::PhoneEquipments, id).await?;
        order.photos = self.fetch_values(ChildTable::Photos, id).await?;
        order.costs = self.fetch_costs(id).await?;

        Ok(Some(order))
    }

    async fn is_slug_taken(&self, store_id: StoreId, slug: &str) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM repair_orders WHERE store_id = $1 AND slug = $2)",
        )
        .bind(store_id.as_uuid())
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn get_damage_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[DamageTypeId],
    ) -> Result<Vec<String>> {
        let ids = ids.iter().map(|id| id.as_uuid()).collect();
        self.names_by_ids("damage_types", store_id, ids).await
    }

    async fn get_phone_condition_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[PhoneConditionId],
    ) -> Result<Vec<String>> {
        let ids = ids.iter().map(|id| id.as_uuid()).collect();
        self.names_by_ids("phone_conditions", store_id, ids).await
    }

    async fn get_phone_equipment_names_by_ids(
        &self,
        store_id: StoreId,
        ids: &[PhoneEquipmentId],
    ) -> Result<Vec<String>> {
        let ids = ids.iter().map(|id| id.as_uuid()).collect();
        self.names_by_ids("phone_equipments", store_id, ids).await
    }

    async fn does_technician_exist(&self, store_id: StoreId, id: TechnicianId) -> Result<bool> {
        self.exists_in_store("technicians", store_id, id.as_uuid())
            .await
    }

    async fn does_sales_person_exist(&self, store_id: StoreId, id: SalesPersonId) -> Result<bool> {
        self.exists_in_store("sales_people", store_id, id.as_uuid())
            .await
    }

    async fn does_payment_method_exist(
        &self,
        store_id: StoreId,
        id: PaymentMethodId,
    ) -> Result<bool> {
        self.exists_in_store("payment_methods", store_id, id.as_uuid())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_insert_is_row_count_mismatch() {
        let err = ensure_row_count(ChildTable::Photos, 2, 1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::RowCountMismatch {
                table: ChildTable::Photos,
                expected: 2,
                actual: 1,
            }
        ));
    }

    #[test]
    fn test_surplus_rows_are_row_count_mismatch() {
        let err = ensure_row_count(ChildTable::Costs, 1, 2).unwrap_err();
        assert!(matches!(
            err,
            StoreError::RowCountMismatch {
                table: ChildTable::Costs,
                expected: 1,
                actual: 2,
            }
        ));
    }

    #[test]
    fn test_matching_row_count_passes() {
        assert!(ensure_row_count(ChildTable::Photos, 2, 2).is_ok());
        assert!(ensure_row_count(ChildTable::Damages, 0, 0).is_ok());
    }
}
