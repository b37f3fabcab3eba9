//! The user-facing merge action: store → format → layout → name → table.

use gridmerge_core::{format_selections, SelectionStore};

use crate::error::MergeError;
use crate::host::DocumentHost;
use crate::layout::merge_side_by_side;
use crate::materialize::{MaterializeOptions, Materialized, SheetMaterializer};
use crate::prompt::{request_table_name, NamePrompt};

pub const DEFAULT_TABLE_NAME: &str = "Merged_Selections";
pub const DEFAULT_DIALOG_TITLE: &str = "Name for the merged table";

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Pre-filled value of the name prompt
    pub suggested_name: String,
    pub dialog_title: String,
    pub materialize: MaterializeOptions,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            suggested_name: DEFAULT_TABLE_NAME.to_string(),
            dialog_title: DEFAULT_DIALOG_TITLE.to_string(),
            materialize: MaterializeOptions::default(),
        }
    }
}

/// Merge every selection in `store` into one new table.
///
/// Returns `Ok(None)` when the user cancels the name prompt; nothing is
/// written and the store is untouched. The store is cleared only after the
/// table was created and filled. Every failure leaves the store as it was.
pub fn merge_selections<H, P>(
    store: &mut SelectionStore,
    host: &mut H,
    prompt: &mut P,
    options: &MergeOptions,
) -> Result<Option<Materialized>, MergeError>
where
    H: DocumentHost + ?Sized,
    P: NamePrompt + ?Sized,
{
    if !store.has_selections() {
        return Err(MergeError::NoData("no selections captured".into()));
    }

    let formatted = format_selections(store.list());
    if formatted.is_empty() {
        tracing::warn!(captured = store.len(), "no selection could be formatted");
        return Err(MergeError::NoData("no usable selections".into()));
    }
    let grid = merge_side_by_side(&formatted)?;

    let Some(name) = request_table_name(prompt, &options.dialog_title, &options.suggested_name)
    else {
        tracing::debug!("merge cancelled at name prompt");
        return Ok(None);
    };

    let materializer = SheetMaterializer::new(options.materialize.clone());
    let outcome = materializer.materialize(host, &grid, &name)?;
    store.clear_selections();
    Ok(Some(outcome))
}
