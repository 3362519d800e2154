// Invoice adjustment model.
//
// An adjustment is a named amount applied alongside the subtotal: additions
// increase the total, deductions decrease it. Amounts are non-negative minor
// units; the sign comes from the kind.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// Direction of an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Addition,
    Deduction,
}

impl std::fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustmentKind::Addition => write!(f, "addition"),
            AdjustmentKind::Deduction => write!(f, "deduction"),
        }
    }
}

impl std::str::FromStr for AdjustmentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "addition" => Ok(AdjustmentKind::Addition),
            "deduction" => Ok(AdjustmentKind::Deduction),
            _ => Err(format!("Invalid adjustment kind: {}", s)),
        }
    }
}

/// A stored adjustment row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceAdjustment {
    pub id: i64,

    pub invoice_id: i64,

    pub description: String,

    pub kind: AdjustmentKind,

    /// Non-negative magnitude in minor units; sign comes from `kind`
    pub amount: i64,
}

/// Validated adjustment fields, before an identity is assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentInput {
    pub description: String,
    pub kind: AdjustmentKind,
    pub amount: i64,
}

impl AdjustmentInput {
    /// Create validated adjustment fields
    pub fn new(description: String, kind: AdjustmentKind, amount: i64) -> Result<Self> {
        if description.trim().is_empty() {
            return Err(AppError::validation(
                "Adjustment description cannot be empty",
            ));
        }

        if amount < 0 {
            return Err(AppError::validation(format!(
                "Adjustment amount must be non-negative, got: {}",
                amount
            )));
        }

        Ok(Self {
            description,
            kind,
            amount,
        })
    }

    /// Signed contribution to the adjustments total
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            AdjustmentKind::Addition => self.amount,
            AdjustmentKind::Deduction => -self.amount,
        }
    }
}

impl From<&InvoiceAdjustment> for AdjustmentInput {
    fn from(adj: &InvoiceAdjustment) -> Self {
        Self {
            description: adj.description.clone(),
            kind: adj.kind,
            amount: adj.amount,
        }
    }
}
