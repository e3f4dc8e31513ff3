//! Hiring report queries. All grouping and ordering happens in the warehouse.

use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, Statement, Value};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{DepartmentAboveMean, HiringReports, QuarterlyHires, ReportTable};

use super::Warehouse;

/// Hires per department and job for each quarter of the year.
const HIRES_BY_QUARTER_SQL: &str = r#"
SELECT
    d.department AS department,
    j.job AS job,
    COUNT(*) FILTER (WHERE EXTRACT(QUARTER FROM he.datetime) = 1) AS q1,
    COUNT(*) FILTER (WHERE EXTRACT(QUARTER FROM he.datetime) = 2) AS q2,
    COUNT(*) FILTER (WHERE EXTRACT(QUARTER FROM he.datetime) = 3) AS q3,
    COUNT(*) FILTER (WHERE EXTRACT(QUARTER FROM he.datetime) = 4) AS q4
FROM hired_employees he
INNER JOIN departments d ON d.id = he.department_id
INNER JOIN jobs j ON j.id = he.job_id
WHERE CAST(EXTRACT(YEAR FROM he.datetime) AS INTEGER) = $1
GROUP BY d.department, j.job
ORDER BY d.department ASC, j.job ASC
"#;

/// Departments hiring strictly more than the mean across departments.
const DEPARTMENTS_ABOVE_MEAN_SQL: &str = r#"
WITH hires AS (
    SELECT
        CAST(d.id AS BIGINT) AS id,
        d.department AS department,
        COUNT(*) AS hired
    FROM hired_employees he
    INNER JOIN departments d ON d.id = he.department_id
    WHERE CAST(EXTRACT(YEAR FROM he.datetime) AS INTEGER) = $1
    GROUP BY d.id, d.department
)
SELECT id, department, hired
FROM hires
WHERE hired > (SELECT AVG(hired) FROM hires)
ORDER BY hired DESC, department ASC
"#;

/// Validate a year parameter.
///
/// Only a non-empty string of ASCII digits fitting in `i32` is accepted.
pub fn parse_year(input: &str) -> AppResult<i32> {
    let trimmed = input.trim();

    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidInput(format!(
            "Year must be a non-negative integer, got '{}'",
            input
        )));
    }

    trimmed
        .parse::<i32>()
        .map_err(|_| AppError::InvalidInput(format!("Year '{}' is out of range", input)))
}

impl Warehouse {
    /// Hires per department and job, split by quarter.
    pub async fn hires_by_quarter(&self, year: i32) -> AppResult<ReportTable<QuarterlyHires>> {
        let conn = self.connect().await?;
        let result = query_hires_by_quarter(&conn, year).await;
        Self::release(conn).await;
        result
    }

    /// Departments that hired more than the yearly mean.
    pub async fn departments_above_mean(
        &self,
        year: i32,
    ) -> AppResult<ReportTable<DepartmentAboveMean>> {
        let conn = self.connect().await?;
        let result = query_departments_above_mean(&conn, year).await;
        Self::release(conn).await;
        result
    }

    /// Run both reports over one connection.
    pub async fn run_reports(&self, year: i32) -> AppResult<HiringReports> {
        let conn = self.connect().await?;
        let result = async {
            Ok::<_, AppError>(HiringReports {
                hires_by_quarter: query_hires_by_quarter(&conn, year).await?,
                departments_above_mean: query_departments_above_mean(&conn, year).await?,
            })
        }
        .await;
        Self::release(conn).await;
        result
    }
}

fn year_statement(sql: &str, year: i32) -> Statement {
    Statement::from_sql_and_values(DatabaseBackend::Postgres, sql, [Value::from(year)])
}

async fn query_hires_by_quarter(
    conn: &DatabaseConnection,
    year: i32,
) -> AppResult<ReportTable<QuarterlyHires>> {
    let rows = QuarterlyHires::find_by_statement(year_statement(HIRES_BY_QUARTER_SQL, year))
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to run hires by quarter: {}", e)))?;

    info!(year, rows = rows.len(), "Hires by quarter report");
    Ok(ReportTable::new(year, QuarterlyHires::COLUMNS, rows))
}

async fn query_departments_above_mean(
    conn: &DatabaseConnection,
    year: i32,
) -> AppResult<ReportTable<DepartmentAboveMean>> {
    let rows =
        DepartmentAboveMean::find_by_statement(year_statement(DEPARTMENTS_ABOVE_MEAN_SQL, year))
            .all(conn)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to run departments above mean: {}", e))
            })?;

    info!(year, rows = rows.len(), "Departments above mean report");
    Ok(ReportTable::new(year, DepartmentAboveMean::COLUMNS, rows))
}
