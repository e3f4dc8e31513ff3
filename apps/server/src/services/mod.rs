//! Business logic services.

pub mod ingest;
pub mod normalize;

use std::path::Path;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{Dataset, SchemaRegistry, TableSchema};

pub use ingest::parse_csv;
pub use normalize::normalize;

/// Resolve, parse and normalize one uploaded file.
///
/// The filename is checked before the content is touched, so an unknown
/// file never reaches the parser.
pub fn prepare_upload<'a>(
    registry: &'a SchemaRegistry,
    file_name: &str,
    content: &[u8],
) -> AppResult<(&'a TableSchema, Dataset)> {
    let schema = registry.resolve(file_name)?;
    let raw = parse_csv(content, schema)?;
    let parsed_rows = raw.len();
    let dataset = normalize(raw, schema);

    info!(
        file = %file_name,
        table = %schema.table,
        rows = parsed_rows,
        "Prepared upload"
    );

    Ok((schema, dataset))
}

/// Read an upload from disk.
///
/// Returns the file's name and bytes. The name must resolve to a known
/// schema; unknown files are rejected without being opened.
pub async fn read_upload_file(
    registry: &SchemaRegistry,
    path: &Path,
) -> AppResult<(String, Vec<u8>)> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    registry.resolve(&file_name)?;

    let content = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read {}: {}", path.display(), e)))?;

    Ok((file_name, content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_upload_departments() {
        let registry = SchemaRegistry::standard();
        let (schema, dataset) =
            prepare_upload(&registry, "departments.csv", b"1,IT\n2,Sales\n").unwrap();

        assert_eq!(schema.table, "departments");
        assert_eq!(
            dataset.rows,
            vec![
                vec![Some("1".to_string()), Some("IT".to_string())],
                vec![Some("2".to_string()), Some("Sales".to_string())],
            ]
        );
    }

    #[test]
    fn test_prepare_upload_rejects_unknown_file_before_parsing() {
        let registry = SchemaRegistry::standard();
        // Content is not valid CSV for any schema; the filename check must win.
        let err = prepare_upload(&registry, "foo.csv", b"\xFF,\xFF,\xFF,\xFF,\xFF,\xFF\n")
            .unwrap_err();
        assert!(matches!(err, AppError::SchemaMismatch(ref f) if f == "foo.csv"));
    }

    #[actix_rt::test]
    async fn test_read_upload_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        std::fs::write(&path, "1,Engineer\n").unwrap();

        let registry = SchemaRegistry::standard();
        let (file_name, content) = read_upload_file(&registry, &path).await.unwrap();

        assert_eq!(file_name, "jobs.csv");
        assert_eq!(content, b"1,Engineer\n");
    }

    #[actix_rt::test]
    async fn test_read_upload_file_unknown_name_not_opened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foo.csv");

        // The file does not exist; the name alone is rejected
        let err = read_upload_file(&SchemaRegistry::standard(), &path)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SchemaMismatch(_)), "{:?}", err);
    }

    #[actix_rt::test]
    async fn test_read_upload_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("departments.csv");

        let err = read_upload_file(&SchemaRegistry::standard(), &path)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)), "{:?}", err);
    }
}
