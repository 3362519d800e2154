pub mod calculator;
pub mod invoice_service;
pub mod numbering;
pub mod reconciler;

pub use calculator::InvoiceTotals;
pub use invoice_service::InvoiceService;
pub use reconciler::{DesiredChild, ReconcilePlan};
