use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::modules::invoices::models::{CreateInvoiceRequest, UpdateInvoiceRequest};
use crate::modules::invoices::services::invoice_service::InvoiceService;

/// Create a new invoice
/// POST /api/invoices
pub async fn create_invoice(
    service: web::Data<Arc<InvoiceService>>,
    user: CurrentUser,
    request: web::Json<CreateInvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.create_invoice(user.id, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(invoice))
}

/// List the authenticated user's invoices
/// GET /api/invoices
pub async fn list_invoices(
    service: web::Data<Arc<InvoiceService>>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let invoices = service.list_invoices(user.id).await?;

    Ok(HttpResponse::Ok().json(invoices))
}

/// Get a single invoice
/// GET /api/invoices/{id}
pub async fn get_invoice(
    service: web::Data<Arc<InvoiceService>>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.get_invoice(user.id, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(invoice))
}

/// Update an invoice (patch semantics, children reconciled)
/// PUT /api/invoices/{id}
pub async fn update_invoice(
    service: web::Data<Arc<InvoiceService>>,
    user: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<UpdateInvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice = service
        .update_invoice(user.id, path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(invoice))
}

/// Delete an invoice and its children
/// DELETE /api/invoices/{id}
pub async fn delete_invoice(
    service: web::Data<Arc<InvoiceService>>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    service.delete_invoice(user.id, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "invoice deleted"
    })))
}

/// Configure invoice routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invoices")
            .route("", web::post().to(create_invoice))
            .route("", web::get().to(list_invoices))
            .route("/{id}", web::get().to(get_invoice))
            .route("/{id}", web::put().to(update_invoice))
            .route("/{id}", web::delete().to(delete_invoice)),
    );
}
