// Invoice entity and status lifecycle.
//
// An invoice belongs to one user and owns an ordered collection of line
// items and signed adjustments. The four monetary fields are derived by the
// calculator and stored in minor currency units; they are never accepted
// from the client.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::adjustment::InvoiceAdjustment;
use super::line_item::InvoiceItem;

/// Invoice status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Invoice is being drafted, not yet delivered
    Draft,

    /// Invoice delivered to the customer
    Sent,

    /// Customer has paid
    Paid,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Draft => write!(f, "draft"),
            InvoiceStatus::Sent => write!(f, "sent"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// Represents a stored invoice
#[derive(Debug, Clone, FromRow)]
pub struct Invoice {
    /// Storage-assigned identity
    pub id: i64,

    /// Owning user
    pub user_id: i64,

    /// Human-readable number, unique, assigned at creation
    pub invoice_number: String,

    pub customer_name: String,
    pub customer_email: String,

    /// Optional payment deadline
    pub due_date: Option<NaiveDate>,

    /// Tax rate as a percentage (10 = 10%)
    pub tax_rate: Decimal,

    pub status: InvoiceStatus,

    /// Sum of quantity x unit_price over all items (minor units)
    pub subtotal: i64,

    /// floor(subtotal x tax_rate / 100) (minor units)
    pub tax_amount: i64,

    /// Additions minus deductions; may be negative (minor units)
    pub adjustments_total: i64,

    /// subtotal + tax_amount + adjustments_total (minor units)
    pub total: i64,

    /// Optional reference to the bank account shown on the invoice
    pub bank_account_id: Option<i64>,

    /// Optimistic-lock counter, incremented on every update
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Line items (joined from invoice_items)
    #[sqlx(skip)]
    pub items: Vec<InvoiceItem>,

    /// Adjustments (joined from invoice_adjustments)
    #[sqlx(skip)]
    pub adjustments: Vec<InvoiceAdjustment>,
}
