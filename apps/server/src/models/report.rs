//! Report result shapes returned by the warehouse aggregate queries.

use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Hires per department and job, split by quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct QuarterlyHires {
    pub department: Option<String>,
    pub job: Option<String>,
    pub q1: i64,
    pub q2: i64,
    pub q3: i64,
    pub q4: i64,
}

impl QuarterlyHires {
    pub const COLUMNS: &'static [&'static str] = &["department", "job", "q1", "q2", "q3", "q4"];
}

/// A department whose yearly hires exceed the mean across departments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct DepartmentAboveMean {
    pub id: i64,
    pub department: Option<String>,
    pub hired: i64,
}

impl DepartmentAboveMean {
    pub const COLUMNS: &'static [&'static str] = &["id", "department", "hired"];
}

/// Column names plus rows of one report, as returned by the warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportTable<T> {
    pub year: i32,
    pub columns: Vec<String>,
    pub rows: Vec<T>,
}

impl<T> ReportTable<T> {
    pub fn new(year: i32, columns: &[&str], rows: Vec<T>) -> Self {
        Self {
            year,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Both hiring reports for one year.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HiringReports {
    pub hires_by_quarter: ReportTable<QuarterlyHires>,
    pub departments_above_mean: ReportTable<DepartmentAboveMean>,
}

/// Query string for report endpoints. The year is validated before use.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Calendar year, e.g. `2021`.
    pub year: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_of<T: Serialize>(row: &T) -> Vec<String> {
        match serde_json::to_value(row).unwrap() {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("expected an object, got {}", other),
        }
    }

    #[test]
    fn test_quarterly_columns_name_row_fields() {
        let row = QuarterlyHires {
            department: Some("IT".to_string()),
            job: Some("Engineer".to_string()),
            q1: 2,
            q2: 0,
            q3: 0,
            q4: 1,
        };
        let keys = keys_of(&row);

        assert_eq!(keys.len(), QuarterlyHires::COLUMNS.len());
        for column in QuarterlyHires::COLUMNS {
            assert!(keys.iter().any(|k| k == column), "missing {}", column);
        }
    }

    #[test]
    fn test_above_mean_columns_name_row_fields() {
        let row = DepartmentAboveMean {
            id: 1,
            department: Some("IT".to_string()),
            hired: 4,
        };
        let keys = keys_of(&row);

        assert_eq!(keys.len(), DepartmentAboveMean::COLUMNS.len());
        for column in DepartmentAboveMean::COLUMNS {
            assert!(keys.iter().any(|k| k == column), "missing {}", column);
        }
    }
}
