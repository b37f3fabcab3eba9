//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts rely on them; do not renumber.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unreadable input, write failure)      |
//! | 2    | Usage error (bad arguments, unsupported file type)   |
//! | 3    | Nothing to merge                                     |
//! | 4    | No free table name within the retry budget           |
//! | 5    | The document rejected table creation or row insert   |
//! | 6    | Cancelled at the name prompt                         |
//! | 7    | Import validation failed                             |

use gridmerge_engine::MergeError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing file, unsupported file type.
pub const EXIT_USAGE: u8 = 2;

/// No usable selection, or the selections produced no columns.
pub const EXIT_NO_DATA: u8 = 3;

/// Every candidate table name was taken.
pub const EXIT_NAME_EXHAUSTED: u8 = 4;

/// Table creation or row insert failed.
pub const EXIT_MUTATION: u8 = 5;

/// User cancelled the name prompt. Nothing was written.
pub const EXIT_CANCELLED: u8 = 6;

/// One or more input files failed import validation.
pub const EXIT_INVALID_IMPORT: u8 = 7;

/// Exit code for an engine error.
pub fn merge_exit_code(err: &MergeError) -> u8 {
    match err {
        MergeError::NoData(_) => EXIT_NO_DATA,
        MergeError::NameGenerationExhausted(_) => EXIT_NAME_EXHAUSTED,
        MergeError::Mutation { .. } => EXIT_MUTATION,
        MergeError::Validation(_) => EXIT_USAGE,
    }
}
