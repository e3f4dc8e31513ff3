//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod reports;
pub mod schemas;
pub mod uploads;

use actix_web::web;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use reports::configure_routes as configure_report_routes;
pub use schemas::configure_routes as configure_schema_routes;
pub use uploads::{UploadLimits, configure_routes as configure_upload_routes};

/// Register every `/api/v1` route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(configure_health_routes)
            .configure(configure_schema_routes)
            .configure(configure_upload_routes)
            .configure(configure_report_routes),
    );
}
