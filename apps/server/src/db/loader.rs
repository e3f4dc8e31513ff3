//! Transactional bulk loads into the destination tables.

use chrono::NaiveDateTime;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, Statement,
    TransactionTrait, Value,
};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::models::{ColumnKind, ColumnSpec, Dataset, TableSchema};
use crate::services::normalize::{CANONICAL_TIMESTAMP_FORMAT, parse_timestamp};

use super::{Warehouse, quote_ident};

/// Outcome of a committed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoadSummary {
    pub table: &'static str,
    pub rows_inserted: u64,
    /// Number of INSERT statements executed inside the transaction.
    pub statements: usize,
}

impl Warehouse {
    /// Insert every row of `dataset` into the schema's table.
    ///
    /// All rows commit in one transaction or none do. Batches larger than
    /// the per-request row limit are split into several INSERT statements
    /// within that transaction. Values are bound before the connection is
    /// opened, so malformed data never reaches the warehouse.
    pub async fn bulk_insert(
        &self,
        schema: &TableSchema,
        dataset: &Dataset,
    ) -> AppResult<LoadSummary> {
        if dataset.columns != schema.column_names() {
            return Err(AppError::InvalidInput(format!(
                "Dataset columns [{}] do not match table {} [{}]",
                dataset.columns.join(", "),
                schema.table,
                schema.column_names().join(", ")
            )));
        }

        let rows = bind_rows(schema, dataset)?;

        if rows.is_empty() {
            info!(table = %schema.table, "Nothing to load");
            return Ok(LoadSummary {
                table: schema.table,
                rows_inserted: 0,
                statements: 0,
            });
        }

        let conn = self.connect().await?;
        let result = insert_all(&conn, schema, &rows, self.max_rows_per_insert).await;
        Self::release(conn).await;

        if let Ok(ref summary) = result {
            info!(
                table = %summary.table,
                rows = summary.rows_inserted,
                statements = summary.statements,
                "Load committed"
            );
        }

        result
    }
}

async fn insert_all(
    conn: &DatabaseConnection,
    schema: &TableSchema,
    rows: &[Vec<Value>],
    chunk_size: usize,
) -> AppResult<LoadSummary> {
    let txn = conn
        .begin()
        .await
        .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

    match insert_chunks(&txn, schema, rows, chunk_size).await {
        Ok(summary) => {
            txn.commit()
                .await
                .map_err(|e| AppError::Database(format!("Failed to commit load: {}", e)))?;
            Ok(summary)
        }
        Err(e) => {
            warn!(table = %schema.table, "Load failed, rolling back: {}", e);
            if let Err(rollback_err) = txn.rollback().await {
                warn!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

async fn insert_chunks(
    txn: &DatabaseTransaction,
    schema: &TableSchema,
    rows: &[Vec<Value>],
    chunk_size: usize,
) -> AppResult<LoadSummary> {
    let mut rows_inserted = 0;
    let mut statements = 0;

    for stmt in insert_statements(schema, rows, chunk_size) {
        let result = txn.execute_raw(stmt).await.map_err(|e| {
            AppError::Database(format!("Failed to insert into {}: {}", schema.table, e))
        })?;
        rows_inserted += result.rows_affected();
        statements += 1;
    }

    Ok(LoadSummary {
        table: schema.table,
        rows_inserted,
        statements,
    })
}

/// Postgres rejects statements binding more parameters than this.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Rows per INSERT for `schema`: the configured limit, capped so a single
/// statement never exceeds [`MAX_BIND_PARAMS`].
pub fn effective_chunk_size(schema: &TableSchema, max_rows_per_insert: usize) -> usize {
    let by_params = MAX_BIND_PARAMS / schema.width().max(1);
    max_rows_per_insert.min(by_params).max(1)
}

/// Split bound rows into the INSERT statements executed by a load.
pub fn insert_statements(
    schema: &TableSchema,
    rows: &[Vec<Value>],
    max_rows_per_insert: usize,
) -> Vec<Statement> {
    rows.chunks(effective_chunk_size(schema, max_rows_per_insert))
        .map(|chunk| insert_statement(schema, chunk))
        .collect()
}

/// SQL for a multi-row INSERT of `row_count` rows with numbered placeholders.
pub fn insert_sql(schema: &TableSchema, row_count: usize) -> String {
    let width = schema.width();
    let columns = schema
        .columns
        .iter()
        .map(|c| quote_ident(c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let tuples = (0..row_count)
        .map(|row| {
            let placeholders = (1..=width)
                .map(|col| format!("${}", row * width + col))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", placeholders)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(schema.table),
        columns,
        tuples
    )
}

/// Parameterized INSERT for a chunk of bound rows.
pub fn insert_statement(schema: &TableSchema, rows: &[Vec<Value>]) -> Statement {
    let values: Vec<Value> = rows.iter().flatten().cloned().collect();
    Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        insert_sql(schema, rows.len()),
        values,
    )
}

/// Convert every cell into a typed parameter value.
pub fn bind_rows(schema: &TableSchema, dataset: &Dataset) -> AppResult<Vec<Vec<Value>>> {
    dataset
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            schema
                .columns
                .iter()
                .zip(row)
                .map(|(column, cell)| {
                    bind_value(column, cell.as_deref()).map_err(|reason| {
                        AppError::InvalidInput(format!(
                            "{}: row {}, column '{}': {}",
                            schema.file_name,
                            index + 1,
                            column.name,
                            reason
                        ))
                    })
                })
                .collect::<AppResult<Vec<Value>>>()
        })
        .collect()
}

fn bind_value(column: &ColumnSpec, cell: Option<&str>) -> Result<Value, String> {
    match column.kind {
        ColumnKind::Integer => match cell {
            None => Ok(Option::<i64>::None.into()),
            Some(s) => parse_integer(s)
                .map(Value::from)
                .ok_or_else(|| format!("'{}' is not an integer", s)),
        },
        ColumnKind::Text => Ok(cell.map(str::to_string).into()),
        ColumnKind::Timestamp => match cell {
            None => Ok(Option::<NaiveDateTime>::None.into()),
            Some(s) => NaiveDateTime::parse_from_str(s, CANONICAL_TIMESTAMP_FORMAT)
                .ok()
                .or_else(|| parse_timestamp(s))
                .map(Value::from)
                .ok_or_else(|| format!("'{}' is not a timestamp", s)),
        },
    }
}

/// Accepts plain integers and integral floats such as `7.0`.
fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }

    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchemaRegistry;

    fn dataset(columns: Vec<&'static str>, rows: &[&[Option<&str>]]) -> Dataset {
        Dataset {
            columns,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        }
    }

    #[test]
    fn test_insert_sql_numbers_placeholders_row_major() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("departments.csv").unwrap();

        assert_eq!(
            insert_sql(schema, 2),
            "INSERT INTO \"departments\" (\"id\", \"department\") VALUES ($1, $2), ($3, $4)"
        );
    }

    #[test]
    fn test_insert_statement_flattens_values() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("departments.csv").unwrap();
        let data = dataset(
            schema.column_names(),
            &[&[Some("1"), Some("IT")], &[Some("2"), Some("Sales")]],
        );

        let rows = bind_rows(schema, &data).unwrap();
        let stmt = insert_statement(schema, &rows);
        let values = stmt.values.expect("statement has values").0;

        assert_eq!(
            values,
            vec![
                Value::from(1i64),
                Value::from("IT".to_string()),
                Value::from(2i64),
                Value::from("Sales".to_string()),
            ]
        );
    }

    #[test]
    fn test_bind_hired_employee_with_nulls() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("hired_employees.csv").unwrap();
        let data = dataset(
            schema.column_names(),
            &[&[Some("7"), None, Some("2021-07-27 16:02:08"), Some("3.0"), None]],
        );

        let rows = bind_rows(schema, &data).unwrap();
        let expected_ts =
            NaiveDateTime::parse_from_str("2021-07-27 16:02:08", CANONICAL_TIMESTAMP_FORMAT)
                .unwrap();

        assert_eq!(
            rows[0],
            vec![
                Value::from(7i64),
                Option::<String>::None.into(),
                Value::from(expected_ts),
                Value::from(3i64),
                Option::<i64>::None.into(),
            ]
        );
    }

    #[test]
    fn test_bind_rejects_non_integer_id() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("jobs.csv").unwrap();
        let data = dataset(
            schema.column_names(),
            &[&[Some("1"), Some("Engineer")], &[Some("two"), Some("Analyst")]],
        );

        match bind_rows(schema, &data) {
            Err(AppError::InvalidInput(msg)) => {
                assert!(msg.contains("row 2"), "{}", msg);
                assert!(msg.contains("'id'"), "{}", msg);
            }
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer(" -3 "), Some(-3));
        assert_eq!(parse_integer("12.0"), Some(12));
        assert_eq!(parse_integer("12.5"), None);
        assert_eq!(parse_integer("inf"), None);
        assert_eq!(parse_integer("abc"), None);
    }

    fn job_rows(count: usize) -> Vec<Vec<Value>> {
        (0..count)
            .map(|i| vec![Value::from(i as i64), Value::from(format!("job {}", i))])
            .collect()
    }

    fn bound_params(stmt: &Statement) -> usize {
        stmt.values.as_ref().map(|v| v.0.len()).unwrap_or(0)
    }

    #[test]
    fn test_insert_statements_chunk_at_row_limit() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("jobs.csv").unwrap();
        let rows = job_rows(2501);

        let statements = insert_statements(schema, &rows, 1000);

        assert_eq!(statements.len(), 3);
        let total: usize = statements.iter().map(bound_params).sum();
        assert_eq!(total, 2501 * 2);
        assert_eq!(bound_params(&statements[0]), 2000);
        assert!(statements[2].sql.ends_with("($1001, $1002)"));
    }

    #[test]
    fn test_insert_statements_respect_bind_parameter_limit() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("hired_employees.csv").unwrap();
        let row = vec![
            Value::from(1i64),
            Value::from("Ann".to_string()),
            Option::<NaiveDateTime>::None.into(),
            Value::from(1i64),
            Value::from(1i64),
        ];
        let rows = vec![row; 20_000];

        assert_eq!(effective_chunk_size(schema, 20_000), 13_107);

        let statements = insert_statements(schema, &rows, 20_000);

        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| bound_params(s) <= MAX_BIND_PARAMS));
        let total: usize = statements.iter().map(bound_params).sum();
        assert_eq!(total, 20_000 * 5);
    }

    #[test]
    fn test_effective_chunk_size_keeps_smaller_limit() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("departments.csv").unwrap();

        assert_eq!(effective_chunk_size(schema, 1000), 1000);
        assert_eq!(effective_chunk_size(schema, 0), 1);
    }

    #[actix_rt::test]
    async fn test_bulk_insert_rejects_mismatched_columns_without_connecting() {
        use crate::config::WarehouseConfig;
        use secrecy::SecretString;
        use std::time::Duration;

        let warehouse = Warehouse::new(&WarehouseConfig {
            database_url: SecretString::from("postgres://u:p@127.0.0.1:1/none".to_string()),
            connect_timeout: Duration::from_secs(1),
            max_rows_per_insert: 1000,
            run_migrations: false,
        });
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("jobs.csv").unwrap();
        let data = dataset(vec!["job", "id"], &[&[Some("Engineer"), Some("1")]]);

        let err = warehouse.bulk_insert(schema, &data).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)), "{:?}", err);
    }

    #[actix_rt::test]
    async fn test_bulk_insert_empty_dataset_skips_connection() {
        use crate::config::WarehouseConfig;
        use secrecy::SecretString;
        use std::time::Duration;

        let warehouse = Warehouse::new(&WarehouseConfig {
            database_url: SecretString::from("postgres://u:p@127.0.0.1:1/none".to_string()),
            connect_timeout: Duration::from_secs(1),
            max_rows_per_insert: 1000,
            run_migrations: false,
        });
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("departments.csv").unwrap();
        let data = dataset(schema.column_names(), &[]);

        let summary = warehouse.bulk_insert(schema, &data).await.unwrap();
        assert_eq!(summary.rows_inserted, 0);
        assert_eq!(summary.statements, 0);
    }
}
