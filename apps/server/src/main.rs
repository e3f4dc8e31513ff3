//! Hiring warehouse server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tokio::sync::Semaphore;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use hiring_warehouse_lib::api::{self, ApiDoc, UploadLimits};
use hiring_warehouse_lib::config::Config;
use hiring_warehouse_lib::db::Warehouse;
use hiring_warehouse_lib::middleware::RequestLogger;
use hiring_warehouse_lib::models::SchemaRegistry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL must point at the warehouse");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Hiring Warehouse Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let warehouse = Warehouse::new(&config.warehouse);

    if config.warehouse.run_migrations {
        if let Err(e) = warehouse.run_migrations().await {
            error!("{}", e);
            std::process::exit(1);
        }
        info!("Warehouse migrations complete");
    }

    let registry = SchemaRegistry::standard();
    for schema in registry.schemas() {
        info!(
            "Accepting {} -> {} ({})",
            schema.file_name,
            schema.table,
            schema.column_names().join(", ")
        );
    }

    let bind_address = config.bind_address();
    let limits = UploadLimits {
        max_upload_size: config.max_upload_size,
    };
    let is_development = config.is_development();

    // Bounds how many loads run against the warehouse at once
    let load_permits = Arc::new(Semaphore::new(config.max_concurrent_loads));
    info!(
        "Upload limits: {}KB max size, {} concurrent load(s), {} rows per INSERT",
        config.max_upload_size / 1024,
        config.max_concurrent_loads,
        warehouse.max_rows_per_insert()
    );

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (2 workers - development mode)",
            bind_address
        );
        2
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let openapi = ApiDoc::openapi();

    HttpServer::new(move || {
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(warehouse.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(limits))
            .app_data(web::Data::new(load_permits.clone()))
            .configure(api::configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
