//! CSV ingestion: raw bytes into positional rows.

use crate::error::{AppError, AppResult};
use crate::models::{RawDataset, TableSchema};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

/// Parse an uploaded CSV file against a resolved schema.
///
/// Files are normally header-less; a first row whose cells equal the
/// schema's column names (ignoring case and surrounding whitespace) is
/// treated as a header and skipped. Short rows are padded with empty
/// cells; rows wider than the schema are rejected.
pub fn parse_csv(content: &[u8], schema: &TableSchema) -> AppResult<RawDataset> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let width = schema.width();
    let column_names = schema.column_names();

    let mut reader = reader_builder().from_reader(content);
    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;

        if index == 0 && is_header(&record, &column_names) {
            continue;
        }

        if record.len() > width {
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 1);
            return Err(AppError::InvalidInput(format!(
                "{}: line {} has {} fields, expected at most {} ({})",
                schema.file_name,
                line,
                record.len(),
                width,
                column_names.join(", ")
            )));
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(RawDataset { rows })
}

fn is_header(record: &csv::StringRecord, column_names: &[&str]) -> bool {
    record.len() == column_names.len()
        && record
            .iter()
            .zip(column_names)
            .all(|(field, name)| field.trim().eq_ignore_ascii_case(name))
}
