//! Pre-import checks over a batch of files.
//!
//! Every problem is collected; nothing stops at the first error. Errors make
//! the batch invalid, warnings never do.

use std::path::Path;

use serde::Serialize;

use crate::filename::{extension, validate_filename, ImportOptions};
use crate::xlsx_inspect::inspect_xlsx;

/// A file offered for import.
///
/// `size` is the size on disk. Files over the size limit are never read, so
/// their `contents` stay empty.
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub name: String,
    pub contents: Vec<u8>,
    size: u64,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, contents: Vec<u8>) -> Self {
        let size = contents.len() as u64;
        Self {
            name: name.into(),
            contents,
            size,
        }
    }

    /// Read a file from disk, named by its final path component. A file larger
    /// than `max_bytes` is only measured.
    pub fn from_path(path: &Path, max_bytes: u64) -> Result<Self, String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("{}: not a file path", path.display()))?;
        let size = std::fs::metadata(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?
            .len();
        if size > max_bytes {
            tracing::debug!(file = %name, size, max_bytes, "file over size limit, not read");
            return Ok(Self {
                name,
                contents: Vec::new(),
                size,
            });
        }
        let contents = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        Ok(Self::new(name, contents))
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ImportValidation {
    fn finish(mut self) -> Self {
        self.is_valid = self.errors.is_empty();
        self
    }
}

pub fn validate_files_for_import(
    files: &[ImportFile],
    options: &ImportOptions,
) -> ImportValidation {
    let mut report = ImportValidation::default();

    if files.is_empty() {
        report.errors.push("No files selected".to_string());
        return report.finish();
    }
    if files.len() > options.max_files {
        report.errors.push(format!(
            "Too many files: {} selected, at most {} allowed",
            files.len(),
            options.max_files
        ));
    }

    for file in files {
        validate_file(file, options, &mut report);
    }

    let report = report.finish();
    tracing::debug!(
        files = files.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated import"
    );
    report
}

fn validate_file(file: &ImportFile, options: &ImportOptions, report: &mut ImportValidation) {
    let name_check = validate_filename(&file.name, options);
    report
        .errors
        .extend(name_check.errors.into_iter().map(|e| format!("{}: {}", file.name, e)));

    if file.size() == 0 {
        report.errors.push(format!("{}: file is empty", file.name));
        return;
    }
    if file.size() > options.max_file_size_bytes {
        report.errors.push(format!(
            "{}: file is {}, the limit is {}",
            file.name,
            human_size(file.size()),
            human_size(options.max_file_size_bytes)
        ));
        return;
    }

    match extension(&file.name).as_deref() {
        Some("xlsx") | Some("xlsm") => inspect_workbook(file, report),
        Some("xls") | Some("ods") => report.warnings.push(format!(
            "{}: contents of this file type cannot be checked before import",
            file.name
        )),
        _ => {}
    }
}

fn inspect_workbook(file: &ImportFile, report: &mut ImportValidation) {
    let summary = match inspect_xlsx(&file.contents) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(file = %file.name, error = %e, "could not read workbook");
            report.errors.push(format!("{}: {}", file.name, e));
            return;
        }
    };

    if summary.sheets.is_empty() {
        report.errors.push(format!("{}: workbook has no sheets", file.name));
        return;
    }
    for name in summary.duplicate_sheet_names() {
        report
            .errors
            .push(format!("{}: sheet name '{}' is used more than once", file.name, name));
    }
    for sheet in summary.merged_sheets() {
        report.warnings.push(format!(
            "{}: sheet '{}' has {} merged cell range(s); \
             merged values land in the top-left cell only",
            file.name, sheet.name, sheet.merged_cells
        ));
    }
}

fn human_size(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / MIB)
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}
