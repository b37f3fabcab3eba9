use std::collections::HashMap;

use gridmerge_core::names::candidate;
use gridmerge_core::{ColumnSpec, RowId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::host::{DocumentHost, HostError, RowPlaceholder};

/// Stable identifier of a table in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TableRef(pub u64);

/// Case-insensitive lookup key for table names.
pub fn normalize_table_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A table in the in-memory document, stored column-major.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryTable {
    pub id: TableRef,
    pub name: String,
    #[serde(skip)]
    name_key: String,
    columns: Vec<ColumnSpec>,
    row_ids: Vec<RowId>,
    data: FxHashMap<String, Vec<String>>,
}

impl MemoryTable {
    fn new(id: TableRef, name: &str, columns: &[ColumnSpec]) -> Self {
        Self {
            id,
            name: name.to_string(),
            name_key: normalize_table_name(name),
            columns: columns.to_vec(),
            row_ids: Vec::new(),
            data: columns.iter().map(|c| (c.id.clone(), Vec::new())).collect(),
        }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn row_count(&self) -> usize {
        self.row_ids.len()
    }

    pub fn column_values(&self, column_id: &str) -> Option<&[String]> {
        self.data.get(column_id).map(|v| v.as_slice())
    }

    /// Rows in insertion order, values in column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.row_ids.len()).map(move |row| {
            self.columns
                .iter()
                .map(|c| self.data[&c.id][row].as_str())
                .collect()
        })
    }

    /// Check a bulk payload against this table without applying it.
    fn check_rows(
        &self,
        row_ids: &[RowPlaceholder],
        data: &HashMap<String, Vec<String>>,
    ) -> Result<(), HostError> {
        for (column, values) in data {
            if !self.data.contains_key(column) {
                return Err(HostError::UnknownColumn {
                    table: self.name.clone(),
                    column: column.clone(),
                });
            }
            if values.len() != row_ids.len() {
                return Err(HostError::LengthMismatch {
                    column: column.clone(),
                    expected: row_ids.len(),
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }
}

/// In-memory host document holding named tables.
///
/// Table names are unique case-insensitively. Creating a table under a
/// taken name renames it with the usual `_N` suffix, the way a real host
/// resolves a race between two creations.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryDocument {
    tables: Vec<MemoryTable>,
    active_table: Option<usize>,
    /// Next table ref to assign. Monotonically increasing, never reused.
    next_table_ref: u64,
    /// Next host-assigned row id, shared across tables.
    next_row_id: RowId,
    #[serde(skip)]
    staged_create: bool,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document that supports staged creation.
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            active_table: None,
            next_table_ref: 1,
            next_row_id: 1,
            staged_create: true,
        }
    }

    /// Document that only offers the two-step create-then-insert path.
    pub fn without_staged_create() -> Self {
        Self {
            staged_create: false,
            ..Self::new()
        }
    }

    fn generate_table_ref(&mut self) -> TableRef {
        let id = TableRef(self.next_table_ref);
        self.next_table_ref += 1;
        id
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn tables(&self) -> &[MemoryTable] {
        &self.tables
    }

    /// Find a table by name (case-insensitive)
    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        let key = normalize_table_name(name);
        self.tables.iter().find(|t| t.name_key == key)
    }

    fn table_index(&self, name: &str) -> Option<usize> {
        let key = normalize_table_name(name);
        self.tables.iter().position(|t| t.name_key == key)
    }

    pub fn active_table(&self) -> Option<&MemoryTable> {
        self.active_table.and_then(|idx| self.tables.get(idx))
    }

    fn check_new_table(name: &str, columns: &[ColumnSpec]) -> Result<(), HostError> {
        if name.trim().is_empty() {
            return Err(HostError::Rejected("table name is empty".into()));
        }
        let mut seen = FxHashSet::default();
        for column in columns {
            if column.id.is_empty() {
                return Err(HostError::Rejected("column id is empty".into()));
            }
            if !seen.insert(column.id.as_str()) {
                return Err(HostError::Rejected(format!(
                    "duplicate column id '{}'",
                    column.id
                )));
            }
        }
        Ok(())
    }

    /// First free name for `name`, renaming with `_N` when taken.
    fn free_name(&self, name: &str) -> String {
        let name = name.trim();
        let mut attempt = 0;
        loop {
            let next = candidate(name, attempt);
            if !self.table_exists(&next) {
                if attempt > 0 {
                    tracing::debug!(requested = name, actual = %next, "renamed table on create");
                }
                return next;
            }
            attempt += 1;
        }
    }

    fn push_table(&mut self, name: &str, columns: &[ColumnSpec]) -> usize {
        let name = self.free_name(name);
        let id = self.generate_table_ref();
        self.tables.push(MemoryTable::new(id, &name, columns));
        self.tables.len() - 1
    }

    /// Append rows to the table at `index`. The payload must already be checked.
    fn append_rows(
        &mut self,
        index: usize,
        row_ids: &[RowPlaceholder],
        data: &HashMap<String, Vec<String>>,
    ) {
        let mut assigned = Vec::with_capacity(row_ids.len());
        for slot in row_ids {
            let id = match slot {
                Some(id) => *id,
                None => self.next_row_id,
            };
            self.next_row_id = self.next_row_id.max(id + 1);
            assigned.push(id);
        }

        let table = &mut self.tables[index];
        table.row_ids.extend(assigned);
        for column in &table.columns {
            let values = table.data.entry(column.id.clone()).or_default();
            match data.get(&column.id) {
                Some(new_values) => values.extend(new_values.iter().cloned()),
                None => values.extend(std::iter::repeat(String::new()).take(row_ids.len())),
            }
        }
    }
}

impl DocumentHost for MemoryDocument {
    fn table_exists(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    fn create_table(
        &mut self,
        table_id: &str,
        columns: &[ColumnSpec],
    ) -> Result<String, HostError> {
        Self::check_new_table(table_id, columns)?;
        let index = self.push_table(table_id, columns);
        Ok(self.tables[index].name.clone())
    }

    fn bulk_insert_rows(
        &mut self,
        table_id: &str,
        row_ids: &[RowPlaceholder],
        data: &HashMap<String, Vec<String>>,
    ) -> Result<(), HostError> {
        let index = self
            .table_index(table_id)
            .ok_or_else(|| HostError::UnknownTable(table_id.to_string()))?;
        self.tables[index].check_rows(row_ids, data)?;
        self.append_rows(index, row_ids, data);
        Ok(())
    }

    fn navigate_to_table(&mut self, table_id: &str) -> Result<(), HostError> {
        let index = self
            .table_index(table_id)
            .ok_or_else(|| HostError::UnknownTable(table_id.to_string()))?;
        self.active_table = Some(index);
        Ok(())
    }

    fn supports_staged_create(&self) -> bool {
        self.staged_create
    }

    fn create_table_with_rows(
        &mut self,
        table_id: &str,
        columns: &[ColumnSpec],
        row_ids: &[RowPlaceholder],
        data: &HashMap<String, Vec<String>>,
    ) -> Result<String, HostError> {
        if !self.staged_create {
            return Err(HostError::Unsupported("staged table creation".into()));
        }
        Self::check_new_table(table_id, columns)?;
        // Check the rows against a detached table so nothing is created on failure
        MemoryTable::new(TableRef(0), table_id, columns).check_rows(row_ids, data)?;

        let index = self.push_table(table_id, columns);
        self.append_rows(index, row_ids, data);
        Ok(self.tables[index].name.clone())
    }
}
