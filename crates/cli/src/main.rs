// gmerge - merge rows selected from several tables into one new table

mod exit_codes;
mod prompt;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use gridmerge_config::MergeSettings;
use gridmerge_core::SelectionStore;
use gridmerge_engine::{
    merge_selections, validate_table_name, AcceptSuggested, FixedName, MaterializeOptions,
    Materialized, MemoryDocument, MergeError, MergeOptions, NamePrompt,
};
use gridmerge_io::filename::extension;
use gridmerge_io::{validate_files_for_import, ImportFile, ImportValidation};
use tracing_subscriber::EnvFilter;

use exit_codes::{
    merge_exit_code, EXIT_CANCELLED, EXIT_ERROR, EXIT_INVALID_IMPORT, EXIT_SUCCESS, EXIT_USAGE,
};
use prompt::LinePrompt;

#[derive(Parser)]
#[command(name = "gmerge")]
#[command(about = "Merge rows selected from several tables into one new table")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, env = "GMERGE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge delimited files side by side into a new table
    #[command(after_help = "\
Examples:
  gmerge merge sales.csv returns.csv --name Combined
  gmerge merge q1.tsv q2.tsv -t json -o merged.json
  gmerge merge a.csv b.csv --yes")]
    Merge {
        /// Input files, one selection each (csv, tsv, txt)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Table name (skips the prompt)
        #[arg(long, short = 'n', conflicts_with = "yes")]
        name: Option<String>,

        /// Accept the suggested table name without prompting
        #[arg(long, short = 'y')]
        yes: bool,

        /// Output format (defaults to the -o extension, else csv)
        #[arg(long, short = 't')]
        to: Option<OutputFormat>,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Do not open the new table after creating it
        #[arg(long)]
        no_navigate: bool,

        /// Suppress the summary and warnings on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Check files before import
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Size limit in bytes (overrides settings)
        #[arg(long)]
        max_size: Option<u64>,
    },

    /// Show or create the settings file
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the settings file path
    Path,
    /// Print the effective settings as JSON
    Show,
    /// Write a commented default settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Exit with `code` without printing anything more.
    pub fn silent(code: u8) -> Self {
        Self::new(code, "")
    }

    pub fn merge(err: MergeError) -> Self {
        let code = merge_exit_code(&err);
        tracing::error!(code, error = %err, "merge failed");
        let hint = match &err {
            MergeError::NoData(_) => Some("each input needs a header row".to_string()),
            MergeError::NameGenerationExhausted(_) => {
                Some("pick another name with --name".to_string())
            }
            MergeError::Mutation { .. } => err.orphan_table().map(|table| {
                format!("table '{}' exists without rows; remove it before retrying", table)
            }),
            MergeError::Validation(_) => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Merge { files, name, yes, to, output, no_navigate, quiet } => {
            let settings = load_settings(cli.settings.as_deref());
            cmd_merge(&settings, files, name, yes, to, output, no_navigate, quiet)
        }
        Commands::Validate { files, json, max_size } => {
            let settings = load_settings(cli.settings.as_deref());
            cmd_validate(&settings, files, json, max_size)
        }
        Commands::Settings(command) => cmd_settings(cli.settings.as_deref(), command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn load_settings(path: Option<&Path>) -> MergeSettings {
    match path {
        Some(path) => MergeSettings::load_from(path),
        None => MergeSettings::load(),
    }
}

fn read_inputs(paths: &[PathBuf], max_bytes: u64) -> Result<Vec<ImportFile>, CliError> {
    paths
        .iter()
        .map(|path| {
            ImportFile::from_path(path, max_bytes)
                .map_err(|e| CliError::usage(format!("cannot read {}", e)))
        })
        .collect()
}

fn print_report(report: &ImportValidation, to_stdout: bool) {
    for error in &report.errors {
        if to_stdout {
            println!("error: {}", error);
        } else {
            eprintln!("error: {}", error);
        }
    }
    for warning in &report.warnings {
        if to_stdout {
            println!("warning: {}", warning);
        } else {
            eprintln!("warning: {}", warning);
        }
    }
}

// ============================================================================
// merge
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_merge(
    settings: &MergeSettings,
    paths: Vec<PathBuf>,
    name: Option<String>,
    yes: bool,
    to: Option<OutputFormat>,
    output: Option<PathBuf>,
    no_navigate: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let name = name
        .map(|n| validate_table_name(&n))
        .transpose()
        .map_err(|e| CliError::usage(e.to_string()))?;

    let import_options = settings.import_options();
    let files = read_inputs(&paths, import_options.max_file_size_bytes)?;
    let report = validate_files_for_import(&files, &import_options);
    if !report.is_valid {
        print_report(&report, false);
        return Err(CliError::silent(EXIT_INVALID_IMPORT));
    }
    if !quiet {
        print_report(&report, false);
    }

    let mut store = SelectionStore::new();
    for (idx, (file, path)) in files.iter().zip(&paths).enumerate() {
        capture_file(&mut store, idx as u64 + 1, file, path)?;
    }

    let options = MergeOptions {
        suggested_name: settings.default_table_name.clone(),
        materialize: MaterializeOptions {
            navigate: settings.navigate_after_create && !no_navigate,
            ..settings.materialize_options()
        },
        ..MergeOptions::default()
    };

    let mut doc = MemoryDocument::new();
    let mut prompt: Box<dyn NamePrompt> = match name {
        Some(name) => Box::new(FixedName(name)),
        None if yes => Box::new(AcceptSuggested),
        None => Box::new(LinePrompt::new(io::stdin().lock(), io::stderr())),
    };

    let outcome = merge_selections(&mut store, &mut doc, prompt.as_mut(), &options)
        .map_err(CliError::merge)?
        .ok_or_else(|| CliError::new(EXIT_CANCELLED, "merge cancelled, nothing was created"))?;

    let format = to
        .or_else(|| output.as_deref().and_then(OutputFormat::from_path))
        .unwrap_or(OutputFormat::Csv);
    write_output(&doc, &outcome, format, output.as_deref())?;

    if !quiet {
        eprintln!(
            "created table '{}' ({} rows, {} columns)",
            outcome.table_id, outcome.row_count, outcome.column_count
        );
        if let Some(err) = &outcome.navigation_error {
            eprintln!("warning: could not open the new table: {}", err);
        }
    }
    Ok(())
}

/// Capture one delimited file as a selection named after its file stem.
fn capture_file(
    store: &mut SelectionStore,
    section_id: u64,
    file: &ImportFile,
    path: &Path,
) -> Result<(), CliError> {
    let ext = extension(&file.name).unwrap_or_default();
    if !matches!(ext.as_str(), "csv" | "tsv" | "txt") {
        let message = format!("{}: only delimited text files can be merged", file.name);
        return Err(CliError::usage(message)
            .with_hint("save the sheet as CSV first; `gmerge validate` checks workbooks"));
    }

    let content = gridmerge_io::csv::decode_text(file.contents.clone());
    let delimiter = if ext == "tsv" {
        b'\t'
    } else {
        let guess = gridmerge_io::csv::guess_delimiter(&content);
        if guess.is_ambiguous() {
            tracing::warn!(
                file = %file.name,
                delimiter = %char::from(guess.delimiter).escape_default(),
                columns = guess.columns,
                consistent = guess.consistent_lines,
                sampled = guess.sampled_lines,
                "delimiter is a guess, check the merged columns"
            );
        }
        guess.delimiter
    };
    let cells = gridmerge_io::csv::selection_from_str(&content, delimiter).map_err(|e| {
        tracing::error!(file = %file.name, error = %e, "could not capture file");
        CliError::io(format!("{}: {}", file.name, e))
    })?;

    let table_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.name.clone());
    store.add_selection(&file.name, section_id, &table_id, &cells);
    Ok(())
}

fn write_output(
    doc: &MemoryDocument,
    outcome: &Materialized,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let table = doc.table(&outcome.table_id).ok_or_else(|| {
        CliError::io(format!("table '{}' not found after merge", outcome.table_id))
    })?;

    let result = match (format, output) {
        (OutputFormat::Csv, Some(path)) => gridmerge_io::csv::export(table, path),
        (OutputFormat::Tsv, Some(path)) => gridmerge_io::csv::export_tsv(table, path),
        (OutputFormat::Json, Some(path)) => gridmerge_io::json::export(table, path),
        (OutputFormat::Csv, None) => {
            gridmerge_io::csv::write_table(table, io::stdout().lock(), b',')
        }
        (OutputFormat::Tsv, None) => {
            gridmerge_io::csv::write_table(table, io::stdout().lock(), b'\t')
        }
        (OutputFormat::Json, None) => {
            let mut out = io::stdout().lock();
            gridmerge_io::json::write_table(table, &mut out)
                .and_then(|_| writeln!(out).map_err(|e| e.to_string()))
        }
    };
    result.map_err(|e| {
        tracing::error!(table = %outcome.table_id, error = %e, "could not write merged table");
        CliError::io(e)
    })
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(
    settings: &MergeSettings,
    paths: Vec<PathBuf>,
    json: bool,
    max_size: Option<u64>,
) -> Result<(), CliError> {
    let mut options = settings.import_options();
    if let Some(limit) = max_size {
        options.max_file_size_bytes = limit;
    }

    let files = read_inputs(&paths, options.max_file_size_bytes)?;
    let report = validate_files_for_import(&files, &options);

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", out);
    } else {
        print_report(&report, true);
        if report.is_valid {
            println!("ok: {} file(s) can be imported", files.len());
        }
    }

    if report.is_valid {
        Ok(())
    } else {
        Err(CliError::silent(EXIT_INVALID_IMPORT))
    }
}

// ============================================================================
// settings
// ============================================================================

fn cmd_settings(path: Option<&Path>, command: SettingsCommands) -> Result<(), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(MergeSettings::config_path);
    match command {
        SettingsCommands::Path => {
            println!("{}", path.display());
        }
        SettingsCommands::Show => {
            let settings = MergeSettings::load_from(&path);
            let out = serde_json::to_string_pretty(&settings)
                .map_err(|e| CliError::io(e.to_string()))?;
            println!("{}", out);
        }
        SettingsCommands::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::usage(format!("{} already exists", path.display()))
                    .with_hint("use --force to overwrite"));
            }
            MergeSettings::create_default_file(&path).map_err(CliError::io)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
