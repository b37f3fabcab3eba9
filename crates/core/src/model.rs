use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a row inside a source table.
pub type RowId = u64;

// ---------------------------------------------------------------------------
// Captured selections
// ---------------------------------------------------------------------------

/// Identity of a captured selection.
///
/// `seq` is issued by the owning store, monotonically increasing and never
/// reused, so two entries can never share an id. `section_id` records which
/// view section the selection was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectionId {
    pub seq: u64,
    pub section_id: u64,
}

impl std::fmt::Display for SelectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sel-{}-{}", self.section_id, self.seq)
    }
}

/// A source column as seen by the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column id in the source table
    pub col_id: String,
    /// Display label, used as the header
    pub label: String,
}

impl FieldDescriptor {
    pub fn new(col_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            col_id: col_id.into(),
            label: label.into(),
        }
    }
}

/// One user-captured selection. Immutable once created by the store.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionEntry {
    pub(crate) id: SelectionId,
    pub(crate) sheet_name: String,
    pub(crate) table_id: String,
    pub(crate) row_ids: Vec<RowId>,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) headers: Vec<String>,
    pub(crate) cell_data: HashMap<RowId, HashMap<String, String>>,
    pub(crate) timestamp: DateTime<Utc>,
}

impl SelectionEntry {
    pub fn id(&self) -> SelectionId {
        self.id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Header labels, parallel to `fields()`.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Captured value for a row and source column, if any.
    pub fn cell(&self, row: RowId, col_id: &str) -> Option<&str> {
        self.cell_data
            .get(&row)
            .and_then(|cells| cells.get(col_id))
            .map(|s| s.as_str())
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Short human-readable description ("Sheet1 / Orders: 3 rows x 2 cols").
    pub fn describe(&self) -> String {
        format!(
            "{} / {}: {} rows x {} cols",
            self.sheet_name,
            self.table_id,
            self.row_ids.len(),
            self.fields.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Merge input
// ---------------------------------------------------------------------------

/// Display-ready projection of a selection, used as merge input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedSelection {
    pub table_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub headers: Vec<String>,
    /// One object per row, keyed by header
    pub data: Vec<HashMap<String, String>>,
}

impl FormattedSelection {
    /// Build from positional rows. Each row is zipped against `headers`;
    /// short rows leave the trailing headers unset.
    pub fn from_rows(
        table_name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let data: Vec<HashMap<String, String>> = rows
            .into_iter()
            .map(|row| headers.iter().cloned().zip(row).collect())
            .collect();
        Self {
            table_name: table_name.into(),
            row_count: data.len(),
            column_count: headers.len(),
            headers,
            data,
        }
    }

    /// Value at a row index for a header; `None` past the end or when unset.
    pub fn value(&self, row: usize, header: &str) -> Option<&str> {
        self.data
            .get(row)
            .and_then(|r| r.get(header))
            .map(|s| s.as_str())
    }
}

// ---------------------------------------------------------------------------
// Merge output
// ---------------------------------------------------------------------------

/// Column type of a created table. Merged data is always generic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnType {
    #[default]
    Text,
}

impl ColumnType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "Text",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of the target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl ColumnSpec {
    pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ColumnType::Text,
        }
    }
}

/// Columns plus column-major data, every column exactly `row_count` long.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedGrid {
    columns: Vec<ColumnSpec>,
    bulk_data: HashMap<String, Vec<String>>,
    row_count: usize,
}

impl MergedGrid {
    pub fn with_row_count(row_count: usize) -> Self {
        Self {
            columns: Vec::new(),
            bulk_data: HashMap::new(),
            row_count,
        }
    }

    /// Append a column.
    ///
    /// Panics if `values` is not `row_count` long or the id is already
    /// present; both are caller bugs, not data errors.
    pub fn push_column(&mut self, column: ColumnSpec, values: Vec<String>) {
        assert_eq!(
            values.len(),
            self.row_count,
            "column '{}' has {} values, grid has {} rows",
            column.id,
            values.len(),
            self.row_count
        );
        assert!(
            !self.bulk_data.contains_key(&column.id),
            "duplicate column id '{}'",
            column.id
        );
        self.bulk_data.insert(column.id.clone(), values);
        self.columns.push(column);
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_ids(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn bulk_data(&self) -> &HashMap<String, Vec<String>> {
        &self.bulk_data
    }

    pub fn column(&self, id: &str) -> Option<&[String]> {
        self.bulk_data.get(id).map(|v| v.as_slice())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
