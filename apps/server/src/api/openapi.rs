//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, db, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hiring Warehouse Server",
        version = "0.1.0",
        description = "Loads departments, jobs and hired employees CSV files into the warehouse and serves hiring reports"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Upload endpoints
        api::schemas::list_schemas,
        api::uploads::upload_csv,
        // Report endpoints
        api::reports::hires_by_quarter,
        api::reports::departments_above_mean,
        api::reports::hiring_reports,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Uploads
            models::ColumnKind,
            models::ColumnSpec,
            models::TableSchema,
            api::schemas::SchemaListResponse,
            api::uploads::CsvUploadForm,
            api::uploads::UploadResponse,
            db::LoadSummary,
            // Reports
            models::QuarterlyHires,
            models::DepartmentAboveMean,
            models::HiringReports,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and warehouse readiness"),
        (name = "Uploads", description = "CSV ingestion into the warehouse"),
        (name = "Reports", description = "Hiring aggregates computed by the warehouse"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/v1/health",
            "/api/v1/ready",
            "/api/v1/schemas",
            "/api/v1/uploads",
            "/api/v1/reports",
            "/api/v1/reports/hires-by-quarter",
            "/api/v1/reports/departments-above-mean",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {}",
                expected
            );
        }
    }
}
