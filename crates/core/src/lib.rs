//! `gridmerge-core` - captured selections and the types shared by the
//! merge engine.
//!
//! No I/O and no host document access: a [`SelectionStore`] accumulates
//! selections, [`format_selections`] projects them into merge input, and
//! [`names`] hands out collision-free identifiers.

pub mod format;
pub mod model;
pub mod names;
pub mod selection;

pub use format::{format_entry, format_selections, SkipReason};
pub use model::{
    ColumnSpec, ColumnType, FieldDescriptor, FormattedSelection, MergedGrid, RowId,
    SelectionEntry, SelectionId,
};
pub use names::{NameExhausted, UsedNames, DEFAULT_MAX_RETRIES};
pub use selection::{SelectedCells, SelectionSource, SelectionStore};
