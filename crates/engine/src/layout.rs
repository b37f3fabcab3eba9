//! Side-by-side layout of formatted selections into one grid.
//!
//! Columns are concatenated in selection order; rows line up by position
//! only. A selection shorter than the longest one is padded with empty
//! strings.

use gridmerge_core::{ColumnSpec, FormattedSelection, MergedGrid, UsedNames};

use crate::error::MergeError;

/// Column-id prefix for a table name: every character outside
/// `[A-Za-z0-9_]` becomes `_`, then a trailing `_` is appended.
pub fn column_prefix(table_name: &str) -> String {
    let mut prefix: String = table_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    prefix.push('_');
    prefix
}

/// Merge selections side by side.
///
/// Fails with [`MergeError::NoData`] when `selections` is empty or no
/// selection contributes a column.
pub fn merge_side_by_side(selections: &[FormattedSelection]) -> Result<MergedGrid, MergeError> {
    if selections.is_empty() {
        return Err(MergeError::NoData("no selections to merge".into()));
    }

    let max_rows = selections.iter().map(|s| s.row_count).max().unwrap_or(0);
    let mut grid = MergedGrid::with_row_count(max_rows);
    let mut used = UsedNames::new();

    for selection in selections {
        let prefix = column_prefix(&selection.table_name);
        for header in &selection.headers {
            let id = used.claim(&format!("{}{}", prefix, header));
            let values: Vec<String> = (0..max_rows)
                .map(|row| selection.value(row, header).unwrap_or_default().to_string())
                .collect();
            grid.push_column(ColumnSpec::text(id.clone(), id), values);
        }
    }

    if grid.is_empty() {
        return Err(MergeError::NoData("selections produced no columns".into()));
    }

    tracing::debug!(
        selections = selections.len(),
        columns = grid.column_count(),
        rows = grid.row_count(),
        "merged selections"
    );
    Ok(grid)
}
