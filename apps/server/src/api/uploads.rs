//! CSV upload endpoint.
//!
//! `POST /api/v1/uploads` with `multipart/form-data` carrying one file named
//! `departments.csv`, `jobs.csv` or `hired_employees.csv`. The filename
//! selects the destination table before the body is read; the rows are then
//! parsed, normalized and inserted in a single transaction.

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::Warehouse;
use crate::error::{AppError, AppResult};
use crate::models::SchemaRegistry;
use crate::services;

/// Upload limits shared with handlers.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_upload_size: usize,
}

/// Multipart form accepted by the upload endpoint.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CsvUploadForm {
    /// CSV file named departments.csv, jobs.csv or hired_employees.csv.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Upload response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Identifier for log correlation.
    pub upload_id: Uuid,
    pub file_name: String,
    pub table: String,
    /// Rows read from the file (header excluded).
    pub rows_parsed: usize,
    /// Rows committed to the warehouse.
    pub rows_inserted: u64,
    /// INSERT statements executed in the transaction.
    pub statements: usize,
    pub message: String,
}

/// Upload a CSV file into its destination table.
#[utoipa::path(
    post,
    path = "/api/v1/uploads",
    tag = "Uploads",
    request_body(content = CsvUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Rows loaded", body = UploadResponse),
        (status = 400, description = "Unknown file or malformed CSV", body = crate::error::ErrorResponse),
        (status = 413, description = "File too large", body = crate::error::ErrorResponse),
        (status = 500, description = "Insert failed, nothing committed", body = crate::error::ErrorResponse),
        (status = 503, description = "Warehouse unreachable or busy", body = crate::error::ErrorResponse),
    )
)]
#[post("/uploads")]
pub async fn upload_csv(
    mut payload: Multipart,
    warehouse: web::Data<Warehouse>,
    registry: web::Data<SchemaRegistry>,
    limits: web::Data<UploadLimits>,
    load_permits: web::Data<Arc<Semaphore>>,
) -> AppResult<HttpResponse> {
    let upload_id = Uuid::now_v7();

    let (file_name, content) =
        read_csv_field(&mut payload, &registry, limits.max_upload_size).await?;

    info!(
        upload_id = %upload_id,
        file = %file_name,
        bytes = content.len(),
        "Received upload"
    );

    let (schema, dataset) = services::prepare_upload(&registry, &file_name, &content)?;

    let _permit = load_permits.try_acquire().map_err(|_| {
        warn!(upload_id = %upload_id, "Upload rejected: another load is in progress");
        AppError::ServiceUnavailable(
            "Another load is in progress. Please try again later.".to_string(),
        )
    })?;

    let summary = warehouse.bulk_insert(schema, &dataset).await?;

    Ok(HttpResponse::Created().json(UploadResponse {
        upload_id,
        file_name,
        table: summary.table.to_string(),
        rows_parsed: dataset.len(),
        rows_inserted: summary.rows_inserted,
        statements: summary.statements,
        message: format!(
            "Loaded {} rows into {}",
            summary.rows_inserted, summary.table
        ),
    }))
}

/// Read the first file field of the form.
///
/// The filename is resolved against the registry before any bytes are
/// read, so unknown files are rejected without buffering their content.
async fn read_csv_field(
    payload: &mut Multipart,
    registry: &SchemaRegistry,
    max_upload_size: usize,
) -> AppResult<(String, Vec<u8>)> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        // Plain form fields are ignored
        let Some(file_name) = file_name else {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            }
            continue;
        };

        registry.resolve(&file_name)?;

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            if data.len() + chunk.len() > max_upload_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "{} exceeds the {} byte upload limit",
                    file_name, max_upload_size
                )));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok((file_name, data));
    }

    Err(AppError::InvalidInput(
        "Missing file. Send a multipart form with one CSV file.".to_string(),
    ))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_csv);
}
