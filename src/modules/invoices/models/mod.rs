pub mod adjustment;
pub mod dto;
pub mod invoice;
pub mod line_item;

pub use adjustment::{AdjustmentInput, AdjustmentKind, InvoiceAdjustment};
pub use dto::{
    AdjustmentResponse, CreateAdjustmentRequest, CreateInvoiceRequest, CreateItemRequest,
    InvoiceResponse, ItemResponse, UpdateAdjustmentRequest, UpdateInvoiceRequest,
    UpdateItemRequest,
};
pub use invoice::{Invoice, InvoiceStatus};
pub use line_item::{InvoiceItem, ItemInput};
