//! `gridmerge-engine` - merges captured selections into a new table.
//!
//! Pure engine crate: the host document is reached only through the
//! [`DocumentHost`] trait and the user only through [`NamePrompt`].
//! [`MemoryDocument`] is a complete in-memory host.

pub mod document;
pub mod error;
pub mod flow;
pub mod host;
pub mod layout;
pub mod materialize;
pub mod prompt;

pub use document::{MemoryDocument, MemoryTable, TableRef};
pub use error::{MergeError, MutationStage};
pub use flow::{merge_selections, MergeOptions, DEFAULT_TABLE_NAME};
pub use host::{DocumentHost, HostError, RowPlaceholder};
pub use layout::{column_prefix, merge_side_by_side};
pub use materialize::{MaterializeOptions, Materialized, SheetMaterializer};
pub use prompt::{
    request_table_name, validate_table_name, AcceptSuggested, FixedName, NamePrompt, PromptReply,
};
