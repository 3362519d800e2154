// Line item model with field validation.
//
// A line item is one product or service on an invoice. Unit prices are held
// in minor currency units; the subtotal contribution is quantity x unit_price
// and is computed by the calculator, not stored per row.

use serde::Serialize;
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// A stored line item row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceItem {
    pub id: i64,

    pub invoice_id: i64,

    /// Short product/service name
    pub name: String,

    pub description: String,

    /// Number of units, always positive
    pub quantity: i32,

    /// Price per unit in minor currency units, non-negative
    pub unit_price: i64,
}

/// Validated line item fields, before an identity is assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInput {
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub unit_price: i64,
}

impl ItemInput {
    /// Create validated line item fields
    ///
    /// # Arguments
    /// * `name` - Product/service name (must not be empty)
    /// * `description` - Free-form description
    /// * `quantity` - Must be positive
    /// * `unit_price` - Minor units, must be non-negative
    pub fn new(
        name: String,
        description: String,
        quantity: i32,
        unit_price: i64,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Line item name cannot be empty"));
        }

        if quantity <= 0 {
            return Err(AppError::validation(format!(
                "Quantity must be positive, got: {}",
                quantity
            )));
        }

        if unit_price < 0 {
            return Err(AppError::validation(format!(
                "Unit price must be non-negative, got: {}",
                unit_price
            )));
        }

        Ok(Self {
            name,
            description,
            quantity,
            unit_price,
        })
    }
}

impl From<&InvoiceItem> for ItemInput {
    fn from(item: &InvoiceItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}
