//! Request logging middleware.
//!
//! Each request gets a v7 request id and is tagged with the warehouse
//! operation it triggers, so a load or report can be followed from the
//! request line to its outcome.

use std::future::{Ready, ready};
use std::time::{Duration, Instant};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::{StatusCode, header};
use actix_web::web;
use futures_util::future::LocalBoxFuture;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::ReportQuery;

/// Warehouse operation a request maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Report,
    Schemas,
    Health,
    Other,
}

impl Operation {
    /// Classify a request path under the `/api/v1` scope.
    pub fn from_path(path: &str) -> Self {
        let route = path.strip_prefix("/api/v1").unwrap_or(path);
        match route {
            "/uploads" => Operation::Upload,
            "/schemas" => Operation::Schemas,
            "/health" | "/ready" => Operation::Health,
            r if r == "/reports" || r.starts_with("/reports/") => Operation::Report,
            _ => Operation::Other,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::Report => "report",
            Operation::Schemas => "schemas",
            Operation::Health => "health",
            Operation::Other => "other",
        }
    }
}

/// The raw `year` parameter of a report request, if any.
pub fn requested_year(query: &str) -> Option<String> {
    web::Query::<ReportQuery>::from_query(query)
        .ok()
        .and_then(|q| q.into_inner().year)
}

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let request_id = Uuid::now_v7();
        let operation = Operation::from_path(req.path());

        match operation {
            Operation::Upload => {
                let bytes = req
                    .headers()
                    .get(header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                info!(target: "api", request_id = %request_id, path = %req.path(), bytes, "Upload received");
            }
            Operation::Report => {
                let year = requested_year(req.query_string()).unwrap_or_default();
                info!(target: "api", request_id = %request_id, path = %req.path(), year = %year, "Report requested");
            }
            _ => {}
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            log_outcome(request_id, operation, res.status(), start.elapsed());
            Ok(res)
        })
    }
}

fn log_outcome(request_id: Uuid, operation: Operation, status: StatusCode, elapsed: Duration) {
    let op = operation.as_str();
    let status_code = status.as_u16();
    let duration_ms = elapsed.as_millis() as u64;

    if status.is_success() {
        info!(target: "api", request_id = %request_id, operation = op, status = status_code, duration_ms, "Request completed");
    } else if status.is_client_error() {
        warn!(target: "api", request_id = %request_id, operation = op, status = status_code, duration_ms, "Request rejected");
    } else {
        warn!(target: "api", request_id = %request_id, operation = op, status = status_code, duration_ms, "Request failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_from_path() {
        assert_eq!(Operation::from_path("/api/v1/uploads"), Operation::Upload);
        assert_eq!(Operation::from_path("/api/v1/reports"), Operation::Report);
        assert_eq!(
            Operation::from_path("/api/v1/reports/hires-by-quarter"),
            Operation::Report
        );
        assert_eq!(Operation::from_path("/api/v1/schemas"), Operation::Schemas);
        assert_eq!(Operation::from_path("/api/v1/ready"), Operation::Health);
        assert_eq!(Operation::from_path("/api/v1/reportsx"), Operation::Other);
        assert_eq!(Operation::from_path("/swagger-ui/"), Operation::Other);
    }

    #[test]
    fn test_requested_year() {
        assert_eq!(requested_year("year=2021"), Some("2021".to_string()));
        assert_eq!(requested_year("foo=1&year=abc"), Some("abc".to_string()));
        assert_eq!(requested_year(""), None);
    }
}
