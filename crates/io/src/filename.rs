//! Import limits and file name checks.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_FILES: usize = 20;
pub const MAX_FILENAME_LEN: usize = 255;
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] =
    &["csv", "tsv", "txt", "xlsx", "xlsm", "xls", "ods"];

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    pub max_file_size_bytes: u64,
    /// Lowercase, without the dot. Empty allows any extension.
    pub allowed_extensions: Vec<String>,
    pub max_files: usize,
    pub max_filename_len: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_files: DEFAULT_MAX_FILES,
            max_filename_len: MAX_FILENAME_LEN,
        }
    }
}

impl ImportOptions {
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions.is_empty()
            || self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilenameValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Extension after the last dot, lowercased. None for dotfiles and names without one.
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn validate_filename(name: &str, options: &ImportOptions) -> FilenameValidation {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push("File name is empty".to_string());
        return FilenameValidation {
            is_valid: false,
            errors,
        };
    }

    if name.chars().count() > options.max_filename_len {
        errors.push(format!(
            "File name is longer than {} characters",
            options.max_filename_len
        ));
    }

    let mut bad: Vec<char> = name
        .chars()
        .filter(|c| FORBIDDEN_CHARS.contains(c) || c.is_control())
        .collect();
    bad.dedup();
    if !bad.is_empty() {
        let shown: Vec<String> = bad.iter().map(|c| format!("{:?}", c)).collect();
        errors.push(format!("File name contains invalid characters: {}", shown.join(" ")));
    }

    // Device names are reserved with or without an extension
    let stem = name.split('.').next().unwrap_or(name).trim_end();
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
        errors.push(format!("'{}' is a reserved file name", stem));
    }

    if name.ends_with('.') || name.ends_with(' ') {
        errors.push("File name must not end with a dot or a space".to_string());
    }

    match extension(name) {
        Some(ext) if !options.allows_extension(&ext) => {
            errors.push(format!(
                "File type '.{}' is not supported (allowed: {})",
                ext,
                options.allowed_extensions.join(", ")
            ));
        }
        None if !options.allowed_extensions.is_empty() => {
            errors.push("File name has no extension".to_string());
        }
        _ => {}
    }

    FilenameValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
