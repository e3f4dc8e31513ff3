//! Lists the accepted upload files and their destination tables.

use actix_web::{HttpResponse, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{SchemaRegistry, TableSchema};

#[derive(Serialize, ToSchema)]
pub struct SchemaListResponse {
    pub schemas: Vec<TableSchema>,
}

/// List upload schemas.
#[utoipa::path(
    get,
    path = "/api/v1/schemas",
    tag = "Uploads",
    responses(
        (status = 200, description = "Accepted files and their tables", body = SchemaListResponse)
    )
)]
#[get("/schemas")]
pub async fn list_schemas(registry: web::Data<SchemaRegistry>) -> HttpResponse {
    HttpResponse::Ok().json(SchemaListResponse {
        schemas: registry.schemas().to_vec(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_schemas);
}
