use std::sync::Arc;

use chrono::NaiveDate;

use crate::core::money::to_minor_units;
use crate::core::{AppError, Patch, Result};
use crate::modules::invoices::models::dto::parse_id;
use crate::modules::invoices::models::{
    AdjustmentInput, CreateInvoiceRequest, Invoice, InvoiceResponse, ItemInput,
    UpdateAdjustmentRequest, UpdateInvoiceRequest, UpdateItemRequest,
};
use crate::modules::invoices::repositories::{InvoiceRepository, InvoiceUpdate, NewInvoice};

use super::calculator::{self, InvoiceTotals};
use super::reconciler::{reconcile, DesiredChild, ReconcilePlan};

/// Service for invoice business logic.
///
/// All operations are scoped to the authenticated user: reading or writing
/// another user's invoice is forbidden, distinct from not-found.
pub struct InvoiceService {
    repo: Arc<dyn InvoiceRepository>,
}

impl InvoiceService {
    pub fn new(repo: Arc<dyn InvoiceRepository>) -> Self {
        Self { repo }
    }

    /// Create a new invoice with its initial items and adjustments.
    ///
    /// Monetary amounts arrive as major-unit decimals and are converted to
    /// minor units here, once, before any arithmetic. Derived totals come
    /// from the calculator; the invoice number is assigned by storage.
    pub async fn create_invoice(
        &self,
        user_id: i64,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceResponse> {
        validate_customer_name(&request.customer_name)?;
        validate_customer_email(&request.customer_email)?;

        if request.items.is_empty() {
            return Err(AppError::validation(
                "Invoice must have at least one line item",
            ));
        }

        let due_date = match request.due_date.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(parse_due_date(raw)?),
        };

        let bank_account_id = match request.bank_account_id.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(parse_id(raw, "bank account")?),
        };

        let items = request
            .items
            .into_iter()
            .map(|item| {
                ItemInput::new(
                    item.name,
                    item.description,
                    item.quantity,
                    to_minor_units(item.price)?,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let adjustments = request
            .adjustments
            .into_iter()
            .map(|adj| {
                AdjustmentInput::new(adj.description, adj.kind, to_minor_units(adj.amount)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let totals = calculator::compute_totals(&items, &adjustments, request.tax_rate)?;

        let invoice = self
            .repo
            .create(NewInvoice {
                user_id,
                customer_name: request.customer_name,
                customer_email: request.customer_email,
                due_date,
                tax_rate: request.tax_rate,
                status: request.status,
                subtotal: totals.subtotal,
                tax_amount: totals.tax_amount,
                adjustments_total: totals.adjustments_total,
                total: totals.total,
                bank_account_id,
                items,
                adjustments,
            })
            .await?;

        tracing::info!(
            invoice_id = invoice.id,
            invoice_number = %invoice.invoice_number,
            user_id,
            "invoice created"
        );

        Ok(InvoiceResponse::from_invoice(&invoice))
    }

    /// Get one invoice owned by this user
    pub async fn get_invoice(&self, user_id: i64, id: i64) -> Result<InvoiceResponse> {
        let invoice = self.find_owned(user_id, id).await?;

        Ok(InvoiceResponse::from_invoice(&invoice))
    }

    /// All invoices of this user, newest first
    pub async fn list_invoices(&self, user_id: i64) -> Result<Vec<InvoiceResponse>> {
        let invoices = self.repo.find_by_user(user_id).await?;

        Ok(invoices.iter().map(InvoiceResponse::from_invoice).collect())
    }

    /// Update an invoice with patch semantics.
    ///
    /// Absent fields are left unchanged. For the child collections an absent
    /// list leaves the collection untouched while a present-but-empty list
    /// deletes every entry; entries carrying an identity overwrite that row,
    /// entries without one are created. Totals are recomputed only when
    /// items, adjustments, or the tax rate changed. The whole update is
    /// applied in one transaction by the repository.
    pub async fn update_invoice(
        &self,
        user_id: i64,
        id: i64,
        request: UpdateInvoiceRequest,
    ) -> Result<InvoiceResponse> {
        let invoice = self.find_owned(user_id, id).await?;

        let recompute = !request.items.is_missing()
            || !request.adjustments.is_missing()
            || !request.tax_rate.is_missing();

        let customer_name =
            apply_required(invoice.customer_name.clone(), request.customer_name, "customer_name")?;
        let customer_email = apply_required(
            invoice.customer_email.clone(),
            request.customer_email,
            "customer_email",
        )?;
        let status = apply_required(invoice.status, request.status, "status")?;
        let tax_rate = apply_required(invoice.tax_rate, request.tax_rate, "tax_rate")?;

        let due_date = match request.due_date {
            Patch::Missing => invoice.due_date,
            Patch::Null => None,
            Patch::Value(raw) if raw.is_empty() => None,
            Patch::Value(raw) => Some(parse_due_date(&raw)?),
        };

        let bank_account_id = match request.bank_account_id {
            Patch::Missing => invoice.bank_account_id,
            Patch::Null => None,
            Patch::Value(raw) if raw.is_empty() => None,
            Patch::Value(raw) => Some(parse_id(&raw, "bank account")?),
        };

        let existing_item_ids: Vec<i64> = invoice.items.iter().map(|item| item.id).collect();
        let (item_inputs, items_plan): (Vec<ItemInput>, ReconcilePlan<ItemInput>) = match request
            .items
        {
            Patch::Missing => (
                invoice.items.iter().map(ItemInput::from).collect(),
                ReconcilePlan::empty(),
            ),
            Patch::Null => {
                return Err(AppError::validation(
                    "items cannot be null; omit the field or send a list",
                ))
            }
            Patch::Value(list) => {
                let desired = desired_items(list)?;
                let inputs = desired.iter().map(|child| child.fields.clone()).collect();
                (inputs, reconcile(&existing_item_ids, desired)?)
            }
        };

        let existing_adjustment_ids: Vec<i64> =
            invoice.adjustments.iter().map(|adj| adj.id).collect();
        let (adjustment_inputs, adjustments_plan): (
            Vec<AdjustmentInput>,
            ReconcilePlan<AdjustmentInput>,
        ) = match request.adjustments {
            Patch::Missing => (
                invoice.adjustments.iter().map(AdjustmentInput::from).collect(),
                ReconcilePlan::empty(),
            ),
            Patch::Null => {
                return Err(AppError::validation(
                    "adjustments cannot be null; omit the field or send a list",
                ))
            }
            Patch::Value(list) => {
                let desired = desired_adjustments(list)?;
                let inputs = desired.iter().map(|child| child.fields.clone()).collect();
                (inputs, reconcile(&existing_adjustment_ids, desired)?)
            }
        };

        let totals = if recompute {
            calculator::compute_totals(&item_inputs, &adjustment_inputs, tax_rate)?
        } else {
            InvoiceTotals {
                subtotal: invoice.subtotal,
                tax_amount: invoice.tax_amount,
                adjustments_total: invoice.adjustments_total,
                total: invoice.total,
            }
        };

        let updated = self
            .repo
            .update(InvoiceUpdate {
                id: invoice.id,
                expected_version: request.version.unwrap_or(invoice.version),
                customer_name,
                customer_email,
                due_date,
                tax_rate,
                status,
                subtotal: totals.subtotal,
                tax_amount: totals.tax_amount,
                adjustments_total: totals.adjustments_total,
                total: totals.total,
                bank_account_id,
                items: items_plan,
                adjustments: adjustments_plan,
            })
            .await?;

        tracing::info!(invoice_id = updated.id, user_id, "invoice updated");

        Ok(InvoiceResponse::from_invoice(&updated))
    }

    /// Delete an invoice; children cascade in the same transaction
    pub async fn delete_invoice(&self, user_id: i64, id: i64) -> Result<()> {
        let invoice = self.find_owned(user_id, id).await?;

        self.repo.delete(invoice.id).await?;

        tracing::info!(invoice_id = id, user_id, "invoice deleted");

        Ok(())
    }

    async fn find_owned(&self, user_id: i64, id: i64) -> Result<Invoice> {
        let invoice = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", id)))?;

        if invoice.user_id != user_id {
            return Err(AppError::forbidden("Invoice belongs to a different user"));
        }

        Ok(invoice)
    }
}

fn desired_items(list: Vec<UpdateItemRequest>) -> Result<Vec<DesiredChild<ItemInput>>> {
    list.into_iter()
        .map(|item| {
            let id = match item.id.as_deref() {
                None | Some("") => None,
                Some(raw) => Some(parse_id(raw, "line item")?),
            };

            Ok(DesiredChild {
                id,
                fields: ItemInput::new(
                    item.name,
                    item.description,
                    item.quantity,
                    to_minor_units(item.price)?,
                )?,
            })
        })
        .collect()
}

fn desired_adjustments(
    list: Vec<UpdateAdjustmentRequest>,
) -> Result<Vec<DesiredChild<AdjustmentInput>>> {
    list.into_iter()
        .map(|adj| {
            let id = match adj.id.as_deref() {
                None | Some("") => None,
                Some(raw) => Some(parse_id(raw, "adjustment")?),
            };

            Ok(DesiredChild {
                id,
                fields: AdjustmentInput::new(adj.description, adj.kind, to_minor_units(adj.amount)?)?,
            })
        })
        .collect()
}

/// Patch application for fields that cannot be cleared
fn apply_required<T>(current: T, patch: Patch<T>, field: &str) -> Result<T> {
    match patch {
        Patch::Missing => Ok(current),
        Patch::Null => Err(AppError::validation(format!("{} cannot be null", field))),
        Patch::Value(value) => Ok(value),
    }
}

fn validate_customer_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Customer name cannot be empty"));
    }

    Ok(())
}

fn validate_customer_email(email: &str) -> Result<()> {
    let well_formed = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);

    if !well_formed {
        return Err(AppError::validation(format!(
            "Invalid customer email: {}",
            email
        )));
    }

    Ok(())
}

fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid due date: {}", raw)))
}
