//! Selection capture and the ordered selection store.
//!
//! The store is a plain owned value. It has a single writer: every mutation
//! takes `&mut self`, and the UI layer that owns the store is expected to
//! serialize add/remove/clear calls. No synchronization is done here.

use std::collections::{HashMap, HashSet};

use crate::model::{FieldDescriptor, RowId, SelectionEntry, SelectionId};

/// Anything that can hand over a rectangular block of cells.
///
/// Read once, at capture time; the store keeps its own copy.
pub trait SelectionSource {
    /// Selected columns, in display order.
    fn fields(&self) -> Vec<FieldDescriptor>;
    /// Selected rows, in display order.
    fn row_ids(&self) -> Vec<RowId>;
    /// Formatted value of one cell, `None` if the cell has no value.
    fn cell_text(&self, row: RowId, col_id: &str) -> Option<String>;
}

/// A detached block of cells: fields plus rows of optional values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedCells {
    fields: Vec<FieldDescriptor>,
    rows: Vec<(RowId, Vec<Option<String>>)>,
}

impl SelectedCells {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    /// Fields whose column id and label are the same header text.
    pub fn with_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        Self::new(
            headers
                .iter()
                .map(|h| FieldDescriptor::new(h.as_ref(), h.as_ref()))
                .collect(),
        )
    }

    /// Append a row of values, positional against the fields.
    pub fn push_row(&mut self, row_id: RowId, values: Vec<Option<String>>) {
        self.rows.push((row_id, values));
    }

    /// Builder form of [`push_row`](Self::push_row) for fully populated rows.
    pub fn row<S: Into<String>>(mut self, row_id: RowId, values: Vec<S>) -> Self {
        self.push_row(row_id, values.into_iter().map(|v| Some(v.into())).collect());
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl SelectionSource for SelectedCells {
    fn fields(&self) -> Vec<FieldDescriptor> {
        self.fields.clone()
    }

    fn row_ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|(id, _)| *id).collect()
    }

    fn cell_text(&self, row: RowId, col_id: &str) -> Option<String> {
        let col = self.fields.iter().position(|f| f.col_id == col_id)?;
        self.rows
            .iter()
            .find(|(id, _)| *id == row)
            .and_then(|(_, values)| values.get(col).cloned().flatten())
    }
}

/// Ordered collection of captured selections.
///
/// Insertion order is the layout order used by every downstream merge.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    entries: Vec<SelectionEntry>,
    /// Next sequence number to issue. Monotonically increasing, never reused.
    next_seq: u64,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 1,
        }
    }

    fn generate_id(&mut self, section_id: u64) -> SelectionId {
        let id = SelectionId {
            seq: self.next_seq,
            section_id,
        };
        self.next_seq += 1;
        debug_assert!(self.entries.iter().all(|e| e.id != id), "selection id reused: {id}");
        id
    }

    /// Capture `source` now and append it to the end of the store.
    ///
    /// Content is not validated here; malformed entries are dropped by
    /// formatting. Duplicate row ids in the source keep their first
    /// occurrence.
    pub fn add_selection(
        &mut self,
        sheet_name: &str,
        section_id: u64,
        table_id: &str,
        source: &dyn SelectionSource,
    ) -> SelectionId {
        let fields = source.fields();
        let headers: Vec<String> = fields.iter().map(|f| f.label.clone()).collect();

        let mut seen = HashSet::new();
        let row_ids: Vec<RowId> = source
            .row_ids()
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut cell_data = HashMap::with_capacity(row_ids.len());
        for &row in &row_ids {
            let cells: HashMap<String, String> = fields
                .iter()
                .filter_map(|f| source.cell_text(row, &f.col_id).map(|v| (f.col_id.clone(), v)))
                .collect();
            cell_data.insert(row, cells);
        }

        let id = self.generate_id(section_id);
        tracing::debug!(
            selection = %id,
            sheet = sheet_name,
            table = table_id,
            rows = row_ids.len(),
            cols = fields.len(),
            "captured selection"
        );

        self.entries.push(SelectionEntry {
            id,
            sheet_name: sheet_name.to_string(),
            table_id: table_id.to_string(),
            row_ids,
            fields,
            headers,
            cell_data,
            timestamp: chrono::Utc::now(),
        });
        id
    }

    /// Remove one entry. Returns false if no entry had this id.
    pub fn remove_selection(&mut self, id: SelectionId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every entry. Sequence numbers keep counting up.
    pub fn clear_selections(&mut self) {
        self.entries.clear();
    }

    /// Entries in insertion order.
    pub fn list(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn get(&self, id: SelectionId) -> Option<&SelectionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn has_selections(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
