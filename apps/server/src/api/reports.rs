//! Hiring report endpoints.
//!
//! The `year` query parameter is validated before a connection is opened.

use actix_web::{HttpResponse, get, web};

use crate::db::{Warehouse, parse_year};
use crate::error::{AppError, AppResult};
use crate::models::{HiringReports, ReportQuery};

fn required_year(query: &ReportQuery) -> AppResult<i32> {
    match query.year.as_deref() {
        Some(year) => parse_year(year),
        None => Err(AppError::InvalidInput(
            "Missing required query parameter: year".to_string(),
        )),
    }
}

/// Hires per department and job for each quarter.
///
/// Ordered by department then job, ascending.
#[utoipa::path(
    get,
    path = "/api/v1/reports/hires-by-quarter",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Quarterly hires", body = crate::models::ReportTable<crate::models::QuarterlyHires>),
        (status = 400, description = "Invalid year", body = crate::error::ErrorResponse),
        (status = 503, description = "Warehouse unreachable", body = crate::error::ErrorResponse),
    )
)]
#[get("/reports/hires-by-quarter")]
pub async fn hires_by_quarter(
    query: web::Query<ReportQuery>,
    warehouse: web::Data<Warehouse>,
) -> AppResult<HttpResponse> {
    let year = required_year(&query)?;
    let report = warehouse.hires_by_quarter(year).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Departments that hired more than the mean for the year.
///
/// Ordered by hire count, descending.
#[utoipa::path(
    get,
    path = "/api/v1/reports/departments-above-mean",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Departments above the mean", body = crate::models::ReportTable<crate::models::DepartmentAboveMean>),
        (status = 400, description = "Invalid year", body = crate::error::ErrorResponse),
        (status = 503, description = "Warehouse unreachable", body = crate::error::ErrorResponse),
    )
)]
#[get("/reports/departments-above-mean")]
pub async fn departments_above_mean(
    query: web::Query<ReportQuery>,
    warehouse: web::Data<Warehouse>,
) -> AppResult<HttpResponse> {
    let year = required_year(&query)?;
    let report = warehouse.departments_above_mean(year).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Both reports for one year.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Both hiring reports", body = HiringReports),
        (status = 400, description = "Invalid year", body = crate::error::ErrorResponse),
        (status = 503, description = "Warehouse unreachable", body = crate::error::ErrorResponse),
    )
)]
#[get("/reports")]
pub async fn hiring_reports(
    query: web::Query<ReportQuery>,
    warehouse: web::Data<Warehouse>,
) -> AppResult<HttpResponse> {
    let year = required_year(&query)?;
    let reports = warehouse.run_reports(year).await?;
    Ok(HttpResponse::Ok().json(reports))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(hires_by_quarter)
        .service(departments_above_mean)
        .service(hiring_reports);
}
