use std::collections::HashMap;

/// Column layout of the transactions tab. Order-significant: rendered rows
/// and stored rows are compared position by position against this list.
pub const TRANSACTION_HEADERS: [&str; 12] = [
    "id",
    "date",
    "account",
    "amount",
    "balance",
    "description_raw",
    "merchant_normalised",
    "category",
    "category_type",
    "is_transfer",
    "source",
    "imported_at",
];

/// One persisted sheet row: column values keyed by header name, plus the
/// 1-based spreadsheet position it was read from.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub row_index: usize,
    pub data: HashMap<String, String>,
}

impl StoredRecord {
    /// Build from raw cells. Short rows are padded with empty strings;
    /// trailing cells beyond the known columns are dropped.
    pub fn from_cells(row_index: usize, cells: Vec<String>) -> Self {
        let mut data = HashMap::with_capacity(TRANSACTION_HEADERS.len());
        for (i, header) in TRANSACTION_HEADERS.iter().enumerate() {
            data.insert(
                (*header).to_string(),
                cells.get(i).cloned().unwrap_or_default(),
            );
        }
        StoredRecord { row_index, data }
    }

    pub fn id(&self) -> &str {
        self.get("id")
    }

    pub fn get(&self, column: &str) -> &str {
        self.data.get(column).map(String::as_str).unwrap_or("")
    }
}
