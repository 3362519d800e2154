use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use faktur::config::Config;
use faktur::middleware::JwtAuth;
use faktur::modules::invoices::controllers::invoice_controller;
use faktur::modules::invoices::repositories::{InvoiceRepository, MySqlInvoiceRepository};
use faktur::modules::invoices::services::InvoiceService;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faktur=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    tracing::info!("Starting Faktur invoicing service");
    tracing::info!("Environment: {}", config.app.env);

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Wire repositories and services
    let invoice_repo: Arc<dyn InvoiceRepository> =
        Arc::new(MySqlInvoiceRepository::new(db_pool.clone()));
    let invoice_service = Arc::new(InvoiceService::new(invoice_repo));

    let jwt_secret = config.auth.jwt_secret.clone();
    let bind_address = config.server.bind_address();

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"])
            .allowed_headers(vec![
                header::ORIGIN,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::AUTHORIZATION,
            ]);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(invoice_service.clone()))
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .wrap(JwtAuth::new(jwt_secret.clone()))
                    .configure(invoice_controller::configure),
            )
    })
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await.context("Server error")
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "faktur"
    }))
}
