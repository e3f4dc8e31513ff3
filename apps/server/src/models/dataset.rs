//! In-memory tabular data passed between ingestion, normalization and load.

/// Rows as read from the CSV file, padded to the schema width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDataset {
    pub rows: Vec<Vec<String>>,
}

impl RawDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Normalized rows with named columns.
///
/// `None` is the null marker. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count of null cells in the given column.
    pub fn null_count(&self, column: &str) -> usize {
        match self.columns.iter().position(|c| *c == column) {
            Some(idx) => self.rows.iter().filter(|row| row[idx].is_none()).count(),
            None => 0,
        }
    }
}
