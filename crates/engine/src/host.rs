//! Boundary to the host document.
//!
//! The engine sees the document only through [`DocumentHost`]: an existence
//! check, table creation, bulk row insert and navigation. Hosts that can
//! create a table together with its rows in one action advertise it through
//! [`DocumentHost::supports_staged_create`].

use std::collections::HashMap;

use gridmerge_core::{ColumnSpec, RowId};
use thiserror::Error;

/// Row id slot for a bulk insert. `None` lets the host assign the id.
pub type RowPlaceholder = Option<RowId>;

/// Errors reported by a host document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("table not found: {0}")]
    UnknownTable(String),

    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("column '{column}' has {actual} value(s), expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("rejected by host: {0}")]
    Rejected(String),
}

pub trait DocumentHost {
    /// True if a table with this name already exists.
    fn table_exists(&self, name: &str) -> bool;

    /// Create an empty table. The returned id is authoritative; the host may
    /// pick a different name than requested.
    fn create_table(&mut self, table_id: &str, columns: &[ColumnSpec]) -> Result<String, HostError>;

    /// Append rows. Every column in `data` holds exactly `row_ids.len()` values.
    fn bulk_insert_rows(
        &mut self,
        table_id: &str,
        row_ids: &[RowPlaceholder],
        data: &HashMap<String, Vec<String>>,
    ) -> Result<(), HostError>;

    /// Show the table to the user. Best-effort.
    fn navigate_to_table(&mut self, table_id: &str) -> Result<(), HostError>;

    /// Whether [`create_table_with_rows`](Self::create_table_with_rows) is available.
    fn supports_staged_create(&self) -> bool {
        false
    }

    /// Create a table and its rows as one action: either both happen or neither.
    fn create_table_with_rows(
        &mut self,
        table_id: &str,
        columns: &[ColumnSpec],
        row_ids: &[RowPlaceholder],
        data: &HashMap<String, Vec<String>>,
    ) -> Result<String, HostError> {
        let _ = (table_id, columns, row_ids, data);
        Err(HostError::Unsupported("staged table creation".into()))
    }
}
