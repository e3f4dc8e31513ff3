//! Normalization of raw CSV rows before load.
//!
//! Every step here is total: any input produces a dataset with the same
//! number of rows and exactly one cell per schema column.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::{ColumnKind, Dataset, RawDataset, TableSchema};

/// Canonical timestamp format written to the warehouse.
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tokens read as missing values (pandas' default NA set).
const NULL_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Name columns from the schema, null out missing values and canonicalize
/// timestamp columns.
pub fn normalize(raw: RawDataset, schema: &TableSchema) -> Dataset {
    let rows = raw
        .rows
        .into_iter()
        .map(|row| normalize_row(row, schema))
        .collect();

    Dataset {
        columns: schema.column_names(),
        rows,
    }
}

fn normalize_row(row: Vec<String>, schema: &TableSchema) -> Vec<Option<String>> {
    let mut cells = row.into_iter();

    schema
        .columns
        .iter()
        .map(|column| {
            let cell = cells.next().and_then(null_if_missing);
            match column.kind {
                ColumnKind::Timestamp => cell.and_then(|value| canonical_timestamp(&value)),
                ColumnKind::Integer | ColumnKind::Text => cell,
            }
        })
        .collect()
}

/// Trim a cell, mapping empty and NA-like values to `None`.
pub fn null_if_missing(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || NULL_TOKENS.contains(&trimmed) {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a timestamp under common conventions.
///
/// Values with an explicit offset are converted to UTC. Date-only values
/// are taken at midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Rewrite a timestamp in the canonical `YYYY-MM-DD HH:MM:SS` form.
pub fn canonical_timestamp(value: &str) -> Option<String> {
    parse_timestamp(value).map(|dt| dt.format(CANONICAL_TIMESTAMP_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchemaRegistry;

    fn raw(rows: &[&[&str]]) -> RawDataset {
        RawDataset {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_normalize_departments() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("departments.csv").unwrap();

        let dataset = normalize(raw(&[&["1", "IT"], &["2", " Sales "]]), schema);

        assert_eq!(dataset.columns, vec!["id", "department"]);
        assert_eq!(
            dataset.rows,
            vec![
                vec![Some("1".to_string()), Some("IT".to_string())],
                vec![Some("2".to_string()), Some("Sales".to_string())],
            ]
        );
    }

    #[test]
    fn test_normalize_replaces_missing_values() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("jobs.csv").unwrap();

        let dataset = normalize(
            raw(&[&["1", ""], &["NaN", "Engineer"], &["3", "  "], &["4", "NULL"]]),
            schema,
        );

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.null_count("job"), 3);
        assert_eq!(dataset.null_count("id"), 1);
    }

    #[test]
    fn test_normalize_hired_employees_timestamps() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("hired_employees.csv").unwrap();

        let dataset = normalize(
            raw(&[
                &["4535", "Marcelo Gonzalez", "2021-07-27T16:02:08Z", "1", "2"],
                &["4572", "Lidia Mendez", "not a date", "12", "3"],
                &["4573", "", "", "", ""],
            ]),
            schema,
        );

        assert_eq!(dataset.rows[0][2].as_deref(), Some("2021-07-27 16:02:08"));
        assert_eq!(dataset.rows[1][2], None);
        assert_eq!(dataset.rows[2], vec![Some("4573".to_string()), None, None, None, None]);
    }

    #[test]
    fn test_normalize_is_total_on_ragged_rows() {
        let registry = SchemaRegistry::standard();
        let schema = registry.resolve("hired_employees.csv").unwrap();

        let dataset = normalize(raw(&[&[], &["1"], &["1", "a", "b", "c", "d", "e"]]), schema);

        assert_eq!(dataset.len(), 3);
        assert!(dataset.rows.iter().all(|row| row.len() == 5));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let cases = [
            ("2021-11-07T02:48:42Z", "2021-11-07 02:48:42"),
            ("2021-11-07T02:48:42+02:00", "2021-11-07 00:48:42"),
            ("2021-11-07T02:48:42", "2021-11-07 02:48:42"),
            ("2021-11-07 02:48:42", "2021-11-07 02:48:42"),
            ("2021-11-07 02:48:42.123", "2021-11-07 02:48:42"),
            ("2021/11/07 02:48:42", "2021-11-07 02:48:42"),
            ("11/07/2021 02:48:42", "2021-11-07 02:48:42"),
            ("2021-11-07", "2021-11-07 00:00:00"),
            ("11/07/2021", "2021-11-07 00:00:00"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                canonical_timestamp(input).as_deref(),
                Some(expected),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        for input in ["", "yesterday", "2021-13-40", "2021-02-30 10:00:00", "1627401728"] {
            assert_eq!(parse_timestamp(input), None, "input {:?}", input);
        }
    }

    #[test]
    fn test_null_if_missing() {
        assert_eq!(null_if_missing("".to_string()), None);
        assert_eq!(null_if_missing("nan".to_string()), None);
        assert_eq!(null_if_missing(" <NA> ".to_string()), None);
        assert_eq!(null_if_missing(" IT ".to_string()), Some("IT".to_string()));
        assert_eq!(null_if_missing("Nancy".to_string()), Some("Nancy".to_string()));
    }
}
