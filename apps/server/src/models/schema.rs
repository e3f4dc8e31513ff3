//! Destination table schemas keyed by upload filename.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// How a column's values are bound when loading into the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Text,
    Timestamp,
}

/// A single destination column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Mapping from an expected upload filename to its destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TableSchema {
    /// Exact filename that selects this schema.
    pub file_name: &'static str,
    /// Destination table in the warehouse.
    pub table: &'static str,
    /// Columns in the table's declared order.
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Column names in declared order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// Immutable set of known table schemas.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<TableSchema>,
}

impl SchemaRegistry {
    /// Build a registry from an explicit schema list.
    pub fn new(schemas: Vec<TableSchema>) -> Self {
        Self { schemas }
    }

    /// The departments, jobs and hired employees tables.
    pub fn standard() -> Self {
        use ColumnKind::{Integer, Text, Timestamp};

        Self::new(vec![
            TableSchema {
                file_name: "departments.csv",
                table: "departments",
                columns: vec![
                    ColumnSpec::new("id", Integer),
                    ColumnSpec::new("department", Text),
                ],
            },
            TableSchema {
                file_name: "jobs.csv",
                table: "jobs",
                columns: vec![ColumnSpec::new("id", Integer), ColumnSpec::new("job", Text)],
            },
            TableSchema {
                file_name: "hired_employees.csv",
                table: "hired_employees",
                columns: vec![
                    ColumnSpec::new("id", Integer),
                    ColumnSpec::new("name", Text),
                    ColumnSpec::new("datetime", Timestamp),
                    ColumnSpec::new("department_id", Integer),
                    ColumnSpec::new("job_id", Integer),
                ],
            },
        ])
    }

    /// All registered schemas.
    pub fn schemas(&self) -> &[TableSchema] {
        &self.schemas
    }

    /// Find the schema for an uploaded file.
    ///
    /// Only the last path component is compared, so `uploads/jobs.csv`
    /// resolves like `jobs.csv`. Matching is exact and case-sensitive.
    pub fn resolve(&self, file_name: &str) -> AppResult<&TableSchema> {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(file_name)
            .trim();

        self.schemas
            .iter()
            .find(|s| s.file_name == base)
            .ok_or_else(|| AppError::SchemaMismatch(file_name.to_string()))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
