// Invoice storage.
//
// `InvoiceRepository` is the narrow storage collaborator the service talks
// to; `MySqlInvoiceRepository` implements it over a connection pool. All
// multi-row work happens inside a transaction: number allocation + parent +
// children on create, version-checked parent update + reconcile plans on
// update, children + parent on delete. Dropping an uncommitted transaction
// rolls it back, so a cancelled request can never commit a partial
// reconciliation.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{
    AdjustmentInput, Invoice, InvoiceAdjustment, InvoiceItem, InvoiceStatus, ItemInput,
};
use crate::modules::invoices::services::numbering::{
    format_invoice_number, month_window, MAX_NUMBERING_ATTEMPTS,
};
use crate::modules::invoices::services::reconciler::ReconcilePlan;

/// A fully validated invoice ready to be persisted, totals already computed
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub user_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub due_date: Option<NaiveDate>,
    pub tax_rate: Decimal,
    pub status: InvoiceStatus,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub adjustments_total: i64,
    pub total: i64,
    pub bank_account_id: Option<i64>,
    pub items: Vec<ItemInput>,
    pub adjustments: Vec<AdjustmentInput>,
}

/// Resolved update: final parent field values plus the child reconcile plans.
/// Child collections are deliberately absent from the parent row update so
/// they are written exactly once, by their plans.
#[derive(Debug, Clone)]
pub struct InvoiceUpdate {
    pub id: i64,
    /// Update applies only while the stored version still matches
    pub expected_version: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub due_date: Option<NaiveDate>,
    pub tax_rate: Decimal,
    pub status: InvoiceStatus,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub adjustments_total: i64,
    pub total: i64,
    pub bank_account_id: Option<i64>,
    pub items: ReconcilePlan<ItemInput>,
    pub adjustments: ReconcilePlan<AdjustmentInput>,
}

/// Transaction-scoped storage for invoices and their children
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Persist a new invoice with its children, assigning the invoice number
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice>;

    /// Load an invoice with its children, or None
    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>>;

    /// All invoices of one user, newest first, children included
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Invoice>>;

    /// Apply a resolved update atomically and return the re-read invoice
    async fn update(&self, update: InvoiceUpdate) -> Result<Invoice>;

    /// Delete an invoice and its children
    async fn delete(&self, id: i64) -> Result<()>;
}

/// MySQL-backed repository
pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// One create attempt: count-then-insert inside a transaction. A unique
    /// violation on invoice_number means a concurrent creation won the same
    /// sequence; the caller retries with a fresh count.
    async fn try_create(&self, invoice: &NewInvoice) -> Result<i64> {
        let now = Utc::now();
        let (window_start, window_end) = month_window(now)?;

        let mut tx = self.pool.begin().await?;

        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM invoices
            WHERE user_id = ? AND created_at >= ? AND created_at < ?
            "#,
        )
        .bind(invoice.user_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_one(&mut *tx)
        .await?;

        let invoice_number = format_invoice_number(now.year(), now.month(), count + 1);

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (
                user_id, invoice_number, customer_name, customer_email, due_date,
                tax_rate, status, subtotal, tax_amount, adjustments_total, total,
                bank_account_id, version, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(invoice.user_id)
        .bind(&invoice_number)
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_email)
        .bind(invoice.due_date)
        .bind(invoice.tax_rate)
        .bind(invoice.status)
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.adjustments_total)
        .bind(invoice.total)
        .bind(invoice.bank_account_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let invoice_id = result.last_insert_id() as i64;

        for item in &invoice.items {
            insert_item(&mut tx, invoice_id, item).await?;
        }

        for adjustment in &invoice.adjustments {
            insert_adjustment(&mut tx, invoice_id, adjustment).await?;
        }

        tx.commit().await?;

        Ok(invoice_id)
    }

    async fn fetch_required(&self, id: i64) -> Result<Invoice> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal(format!("Invoice {} vanished after write", id)))
    }

    async fn load_children(&self, invoice: &mut Invoice) -> Result<()> {
        invoice.items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, invoice_id, name, description, quantity, unit_price
            FROM invoice_items
            WHERE invoice_id = ?
            ORDER BY id
            "#,
        )
        .bind(invoice.id)
        .fetch_all(&self.pool)
        .await?;

        invoice.adjustments = sqlx::query_as::<_, InvoiceAdjustment>(
            r#"
            SELECT id, invoice_id, description, kind, amount
            FROM invoice_adjustments
            WHERE invoice_id = ?
            ORDER BY id
            "#,
        )
        .bind(invoice.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice> {
        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            match self.try_create(&invoice).await {
                Ok(id) => return self.fetch_required(id).await,
                Err(err) if is_number_collision(&err) => {
                    tracing::warn!(
                        user_id = invoice.user_id,
                        attempt,
                        "invoice number collision, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(AppError::conflict(
            "Could not allocate an invoice number, please retry",
        ))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, user_id, invoice_number, customer_name, customer_email,
                   due_date, tax_rate, status, subtotal, tax_amount,
                   adjustments_total, total, bank_account_id, version,
                   created_at, updated_at
            FROM invoices
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut invoice) = invoice else {
            return Ok(None);
        };

        self.load_children(&mut invoice).await?;

        Ok(Some(invoice))
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Invoice>> {
        let mut invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, user_id, invoice_number, customer_name, customer_email,
                   due_date, tax_rate, status, subtotal, tax_amount,
                   adjustments_total, total, bank_account_id, version,
                   created_at, updated_at
            FROM invoices
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        for invoice in &mut invoices {
            self.load_children(invoice).await?;
        }

        Ok(invoices)
    }

    async fn update(&self, update: InvoiceUpdate) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        // Parent row first: the version predicate rejects stale writers, and
        // the row lock serializes concurrent reconciliations of this invoice
        // until commit.
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET customer_name = ?, customer_email = ?, due_date = ?, tax_rate = ?,
                status = ?, bank_account_id = ?, subtotal = ?, tax_amount = ?,
                adjustments_total = ?, total = ?, version = version + 1,
                updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&update.customer_name)
        .bind(&update.customer_email)
        .bind(update.due_date)
        .bind(update.tax_rate)
        .bind(update.status)
        .bind(update.bank_account_id)
        .bind(update.subtotal)
        .bind(update.tax_amount)
        .bind(update.adjustments_total)
        .bind(update.total)
        .bind(Utc::now())
        .bind(update.id)
        .bind(update.expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM invoices WHERE id = ?")
                    .bind(update.id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match exists {
                Some(_) => AppError::conflict(format!(
                    "Invoice {} was modified concurrently, reload and retry",
                    update.id
                )),
                None => AppError::not_found(format!("Invoice {} not found", update.id)),
            });
        }

        for (id, fields) in &update.items.to_update {
            sqlx::query(
                r#"
                UPDATE invoice_items
                SET name = ?, description = ?, quantity = ?, unit_price = ?
                WHERE id = ? AND invoice_id = ?
                "#,
            )
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(fields.quantity)
            .bind(fields.unit_price)
            .bind(id)
            .bind(update.id)
            .execute(&mut *tx)
            .await?;
        }

        for fields in &update.items.to_create {
            insert_item(&mut tx, update.id, fields).await?;
        }

        for id in &update.items.to_delete {
            sqlx::query("DELETE FROM invoice_items WHERE id = ? AND invoice_id = ?")
                .bind(id)
                .bind(update.id)
                .execute(&mut *tx)
                .await?;
        }

        for (id, fields) in &update.adjustments.to_update {
            sqlx::query(
                r#"
                UPDATE invoice_adjustments
                SET description = ?, kind = ?, amount = ?
                WHERE id = ? AND invoice_id = ?
                "#,
            )
            .bind(&fields.description)
            .bind(fields.kind)
            .bind(fields.amount)
            .bind(id)
            .bind(update.id)
            .execute(&mut *tx)
            .await?;
        }

        for fields in &update.adjustments.to_create {
            insert_adjustment(&mut tx, update.id, fields).await?;
        }

        for id in &update.adjustments.to_delete {
            sqlx::query("DELETE FROM invoice_adjustments WHERE id = ? AND invoice_id = ?")
                .bind(id)
                .bind(update.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.fetch_required(update.id).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM invoice_adjustments WHERE invoice_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Invoice {} not found", id)));
        }

        tx.commit().await?;

        Ok(())
    }
}

async fn insert_item(
    tx: &mut Transaction<'_, MySql>,
    invoice_id: i64,
    item: &ItemInput,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_items (invoice_id, name, description, quantity, unit_price)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(invoice_id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.unit_price)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_adjustment(
    tx: &mut Transaction<'_, MySql>,
    invoice_id: i64,
    adjustment: &AdjustmentInput,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_adjustments (invoice_id, description, kind, amount)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(invoice_id)
    .bind(&adjustment.description)
    .bind(adjustment.kind)
    .bind(adjustment.amount)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn is_number_collision(err: &AppError) -> bool {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}
