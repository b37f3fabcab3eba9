//! Projection of captured selections into merge input.
//!
//! Formatting never fails as a whole: a malformed entry is logged and left
//! out and the rest of the pass carries on. Every captured row is kept, so
//! row positions line up with the source selection; missing cells format as
//! empty strings.

use std::collections::HashMap;

use crate::model::{FormattedSelection, SelectionEntry};
use crate::names::UsedNames;

/// Why an entry was left out of the formatted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingTableId,
    NoFields,
    HeaderMismatch { headers: usize, fields: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTableId => write!(f, "missing table id"),
            Self::NoFields => write!(f, "no fields selected"),
            Self::HeaderMismatch { headers, fields } => {
                write!(f, "{headers} header(s) for {fields} field(s)")
            }
        }
    }
}

/// Format every entry in order, dropping the ones that cannot be formatted.
pub fn format_selections(entries: &[SelectionEntry]) -> Vec<FormattedSelection> {
    entries
        .iter()
        .filter_map(|entry| match format_entry(entry) {
            Ok(formatted) => Some(formatted),
            Err(reason) => {
                tracing::warn!(selection = %entry.id(), %reason, "skipping selection");
                None
            }
        })
        .collect()
}

/// Format a single entry.
///
/// Headers are the field labels; a label repeated within the selection gets
/// the usual `_1`, `_2` suffix so every header keys its own value.
pub fn format_entry(entry: &SelectionEntry) -> Result<FormattedSelection, SkipReason> {
    if entry.table_id().trim().is_empty() {
        return Err(SkipReason::MissingTableId);
    }
    if entry.fields().is_empty() {
        return Err(SkipReason::NoFields);
    }
    if entry.headers().len() != entry.fields().len() {
        return Err(SkipReason::HeaderMismatch {
            headers: entry.headers().len(),
            fields: entry.fields().len(),
        });
    }

    let mut used = UsedNames::new();
    let headers: Vec<String> = entry.headers().iter().map(|h| used.claim(h)).collect();

    let mut data = Vec::with_capacity(entry.row_ids().len());
    for &row in entry.row_ids() {
        let values: HashMap<String, String> = headers
            .iter()
            .zip(entry.fields())
            .map(|(header, field)| {
                let value = entry.cell(row, &field.col_id).unwrap_or_default();
                (header.clone(), value.to_string())
            })
            .collect();
        data.push(values);
    }

    Ok(FormattedSelection {
        table_name: entry.table_id().to_string(),
        row_count: data.len(),
        column_count: headers.len(),
        headers,
        data,
    })
}
