// Request and response DTOs for the invoice API.
//
// The boundary speaks major-unit decimals and opaque string identities; the
// core speaks minor-unit integers and i64 identities. Conversion happens
// here and nowhere else.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::money::from_minor_units;
use crate::core::{AppError, Patch, Result};

use super::adjustment::{AdjustmentKind, InvoiceAdjustment};
use super::invoice::{Invoice, InvoiceStatus};
use super::line_item::InvoiceItem;

/// Parse an opaque string identity supplied by a client.
///
/// A malformed identity is a validation error; it is never treated as "new".
pub fn parse_id(value: &str, what: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::validation(format!("Invalid {} id: {}", what, value)))
}

// Request DTOs

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i32,
    /// Major currency units, e.g. "12.50"
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdjustmentRequest {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    /// Major currency units, non-negative
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer_name: String,
    pub customer_email: String,
    /// Optional, "YYYY-MM-DD"
    pub due_date: Option<String>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub items: Vec<CreateItemRequest>,
    #[serde(default)]
    pub adjustments: Vec<CreateAdjustmentRequest>,
    pub bank_account_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemRequest {
    /// Present: overwrite the existing item with this identity.
    /// Absent: create a new item.
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAdjustmentRequest {
    pub id: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub amount: Decimal,
}

/// Patch-style update: absent fields are left unchanged, present fields
/// overwrite. For `items`/`adjustments`, a present-but-empty list deletes
/// every existing entry; an absent list leaves the collection untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInvoiceRequest {
    #[serde(default)]
    pub customer_name: Patch<String>,
    #[serde(default)]
    pub customer_email: Patch<String>,
    #[serde(default)]
    pub due_date: Patch<String>,
    #[serde(default)]
    pub tax_rate: Patch<Decimal>,
    #[serde(default)]
    pub status: Patch<InvoiceStatus>,
    #[serde(default)]
    pub items: Patch<Vec<UpdateItemRequest>>,
    #[serde(default)]
    pub adjustments: Patch<Vec<UpdateAdjustmentRequest>>,
    #[serde(default)]
    pub bank_account_id: Patch<String>,
    /// Optional optimistic-lock pin: when present, the update is rejected
    /// with a conflict unless the stored version still matches.
    #[serde(default)]
    pub version: Option<i64>,
}

// Response DTOs

#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentResponse {
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub due_date: Option<NaiveDate>,
    pub tax_rate: Decimal,
    pub status: InvoiceStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub adjustments_total: Decimal,
    pub total: Decimal,
    pub bank_account_id: Option<String>,
    pub version: i64,
    pub items: Vec<ItemResponse>,
    pub adjustments: Vec<AdjustmentResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl InvoiceResponse {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id.to_string(),
            invoice_number: invoice.invoice_number.clone(),
            customer_name: invoice.customer_name.clone(),
            customer_email: invoice.customer_email.clone(),
            due_date: invoice.due_date,
            tax_rate: invoice.tax_rate,
            status: invoice.status,
            subtotal: from_minor_units(invoice.subtotal),
            tax_amount: from_minor_units(invoice.tax_amount),
            adjustments_total: from_minor_units(invoice.adjustments_total),
            total: from_minor_units(invoice.total),
            bank_account_id: invoice.bank_account_id.map(|id| id.to_string()),
            version: invoice.version,
            items: invoice.items.iter().map(ItemResponse::from_item).collect(),
            adjustments: invoice
                .adjustments
                .iter()
                .map(AdjustmentResponse::from_adjustment)
                .collect(),
            created_at: invoice.created_at.to_rfc3339(),
            updated_at: invoice.updated_at.to_rfc3339(),
        }
    }
}

impl ItemResponse {
    fn from_item(item: &InvoiceItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            price: from_minor_units(item.unit_price),
        }
    }
}

impl AdjustmentResponse {
    fn from_adjustment(adj: &InvoiceAdjustment) -> Self {
        Self {
            id: adj.id.to_string(),
            description: adj.description.clone(),
            kind: adj.kind,
            amount: from_minor_units(adj.amount),
        }
    }
}
