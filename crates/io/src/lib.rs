// File I/O: CSV capture, table export, import validation

pub mod csv;
pub mod filename;
pub mod import_validation;
pub mod json;
pub mod xlsx_inspect;

pub use filename::{validate_filename, FilenameValidation, ImportOptions};
pub use import_validation::{validate_files_for_import, ImportFile, ImportValidation};
pub use xlsx_inspect::{inspect_xlsx, SheetSummary, WorkbookSummary};
