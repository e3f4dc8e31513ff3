//! Domain models for the hiring warehouse.

pub mod dataset;
pub mod report;
pub mod schema;

pub use dataset::{Dataset, RawDataset};
pub use report::{DepartmentAboveMean, HiringReports, QuarterlyHires, ReportQuery, ReportTable};
pub use schema::{ColumnKind, ColumnSpec, SchemaRegistry, TableSchema};
