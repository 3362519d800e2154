// Test infrastructure shared by the unit and contract suites: an in-memory
// repository double that honors the storage contract (numbering, version
// checks, all-or-nothing updates, injectable mid-update failure) plus
// request builders.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;

use faktur::core::{AppError, Result};
use faktur::modules::invoices::models::{
    AdjustmentKind, CreateAdjustmentRequest, CreateInvoiceRequest, CreateItemRequest, Invoice,
    InvoiceAdjustment, InvoiceItem, UpdateAdjustmentRequest, UpdateItemRequest,
};
use faktur::modules::invoices::repositories::{InvoiceRepository, InvoiceUpdate, NewInvoice};
use faktur::modules::invoices::services::numbering::format_invoice_number;

#[derive(Default)]
struct State {
    invoices: Vec<Invoice>,
    next_invoice_id: i64,
    next_child_id: i64,
    /// When set, the nth (1-based) child write in the next update fails,
    /// simulating a mid-transaction storage error.
    fail_on_child_op: Option<usize>,
}

/// In-memory `InvoiceRepository` with transactional update semantics: the
/// update is applied to a scratch copy and swapped in only on success, so a
/// failed update leaves the stored invoice byte-for-byte unchanged.
pub struct MemoryInvoiceRepository {
    state: Mutex<State>,
}

impl MemoryInvoiceRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                invoices: Vec::new(),
                next_invoice_id: 1,
                next_child_id: 1,
                fail_on_child_op: None,
            }),
        }
    }

    /// Make the nth child write of the next update fail
    pub fn fail_on_child_op(&self, nth: usize) {
        self.state.lock().unwrap().fail_on_child_op = Some(nth);
    }
}

#[async_trait]
impl InvoiceRepository for MemoryInvoiceRepository {
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice> {
        let mut state = self.state.lock().unwrap();

        let now = Utc::now();
        let in_month = state
            .invoices
            .iter()
            .filter(|i| {
                i.user_id == invoice.user_id
                    && i.created_at.year() == now.year()
                    && i.created_at.month() == now.month()
            })
            .count() as i64;

        let id = state.next_invoice_id;
        state.next_invoice_id += 1;

        let mut stored = Invoice {
            id,
            user_id: invoice.user_id,
            invoice_number: format_invoice_number(now.year(), now.month(), in_month + 1),
            customer_name: invoice.customer_name,
            customer_email: invoice.customer_email,
            due_date: invoice.due_date,
            tax_rate: invoice.tax_rate,
            status: invoice.status,
            subtotal: invoice.subtotal,
            tax_amount: invoice.tax_amount,
            adjustments_total: invoice.adjustments_total,
            total: invoice.total,
            bank_account_id: invoice.bank_account_id,
            version: 1,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
            adjustments: Vec::new(),
        };

        for item in invoice.items {
            let child_id = state.next_child_id;
            state.next_child_id += 1;
            stored.items.push(InvoiceItem {
                id: child_id,
                invoice_id: id,
                name: item.name,
                description: item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        for adjustment in invoice.adjustments {
            let child_id = state.next_child_id;
            state.next_child_id += 1;
            stored.adjustments.push(InvoiceAdjustment {
                id: child_id,
                invoice_id: id,
                description: adjustment.description,
                kind: adjustment.kind,
                amount: adjustment.amount,
            });
        }

        state.invoices.push(stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        let state = self.state.lock().unwrap();

        Ok(state.invoices.iter().find(|i| i.id == id).cloned())
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Invoice>> {
        let state = self.state.lock().unwrap();

        let mut invoices: Vec<Invoice> = state
            .invoices
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(invoices)
    }

    async fn update(&self, update: InvoiceUpdate) -> Result<Invoice> {
        let mut state = self.state.lock().unwrap();
        let fail_on = state.fail_on_child_op.take();

        let position = state
            .invoices
            .iter()
            .position(|i| i.id == update.id)
            .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", update.id)))?;

        if state.invoices[position].version != update.expected_version {
            return Err(AppError::conflict(format!(
                "Invoice {} was modified concurrently, reload and retry",
                update.id
            )));
        }

        // Scratch copy; swapped in only if every operation succeeds
        let mut scratch = state.invoices[position].clone();
        scratch.customer_name = update.customer_name;
        scratch.customer_email = update.customer_email;
        scratch.due_date = update.due_date;
        scratch.tax_rate = update.tax_rate;
        scratch.status = update.status;
        scratch.bank_account_id = update.bank_account_id;
        scratch.subtotal = update.subtotal;
        scratch.tax_amount = update.tax_amount;
        scratch.adjustments_total = update.adjustments_total;
        scratch.total = update.total;
        scratch.version += 1;
        scratch.updated_at = Utc::now();

        let mut op_counter = 0usize;
        let mut next_child_id = state.next_child_id;

        let mut bump = |counter: &mut usize| -> Result<()> {
            *counter += 1;
            if fail_on == Some(*counter) {
                return Err(AppError::internal("Simulated storage failure"));
            }
            Ok(())
        };

        for (id, fields) in &update.items.to_update {
            bump(&mut op_counter)?;
            let item = scratch
                .items
                .iter_mut()
                .find(|i| i.id == *id)
                .ok_or_else(|| AppError::not_found(format!("Line item {} not found", id)))?;
            item.name = fields.name.clone();
            item.description = fields.description.clone();
            item.quantity = fields.quantity;
            item.unit_price = fields.unit_price;
        }

        for fields in &update.items.to_create {
            bump(&mut op_counter)?;
            scratch.items.push(InvoiceItem {
                id: next_child_id,
                invoice_id: scratch.id,
                name: fields.name.clone(),
                description: fields.description.clone(),
                quantity: fields.quantity,
                unit_price: fields.unit_price,
            });
            next_child_id += 1;
        }

        for id in &update.items.to_delete {
            bump(&mut op_counter)?;
            scratch.items.retain(|i| i.id != *id);
        }

        for (id, fields) in &update.adjustments.to_update {
            bump(&mut op_counter)?;
            let adjustment = scratch
                .adjustments
                .iter_mut()
                .find(|a| a.id == *id)
                .ok_or_else(|| AppError::not_found(format!("Adjustment {} not found", id)))?;
            adjustment.description = fields.description.clone();
            adjustment.kind = fields.kind;
            adjustment.amount = fields.amount;
        }

        for fields in &update.adjustments.to_create {
            bump(&mut op_counter)?;
            scratch.adjustments.push(InvoiceAdjustment {
                id: next_child_id,
                invoice_id: scratch.id,
                description: fields.description.clone(),
                kind: fields.kind,
                amount: fields.amount,
            });
            next_child_id += 1;
        }

        for id in &update.adjustments.to_delete {
            bump(&mut op_counter)?;
            scratch.adjustments.retain(|a| a.id != *id);
        }

        state.next_child_id = next_child_id;
        state.invoices[position] = scratch.clone();

        Ok(scratch)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        let before = state.invoices.len();
        state.invoices.retain(|i| i.id != id);

        if state.invoices.len() == before {
            return Err(AppError::not_found(format!("Invoice {} not found", id)));
        }

        Ok(())
    }
}

// Request builders

pub fn item_request(name: &str, quantity: i32, price: Decimal) -> CreateItemRequest {
    CreateItemRequest {
        name: name.to_string(),
        description: String::new(),
        quantity,
        price,
    }
}

pub fn adjustment_request(
    description: &str,
    kind: AdjustmentKind,
    amount: Decimal,
) -> CreateAdjustmentRequest {
    CreateAdjustmentRequest {
        description: description.to_string(),
        kind,
        amount,
    }
}

pub fn create_request(
    tax_rate: Decimal,
    items: Vec<CreateItemRequest>,
    adjustments: Vec<CreateAdjustmentRequest>,
) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        customer_name: "Acme Corp".to_string(),
        customer_email: "billing@acme.example".to_string(),
        due_date: None,
        tax_rate,
        status: Default::default(),
        items,
        adjustments,
        bank_account_id: None,
    }
}

pub fn update_item(id: Option<&str>, name: &str, quantity: i32, price: Decimal) -> UpdateItemRequest {
    UpdateItemRequest {
        id: id.map(|s| s.to_string()),
        name: name.to_string(),
        description: String::new(),
        quantity,
        price,
    }
}

pub fn update_adjustment(
    id: Option<&str>,
    description: &str,
    kind: AdjustmentKind,
    amount: Decimal,
) -> UpdateAdjustmentRequest {
    UpdateAdjustmentRequest {
        id: id.map(|s| s.to_string()),
        description: description.to_string(),
        kind,
        amount,
    }
}
