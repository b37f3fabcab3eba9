// CSV/TSV capture and table export

use std::io::{Read, Write};
use std::path::Path;

use gridmerge_core::{FieldDescriptor, RowId, SelectedCells};
use gridmerge_engine::MemoryTable;

/// Capture a CSV file as a selection: the header row becomes the fields and
/// every data row gets row id 1, 2, 3, ... in file order.
pub fn read_selection(path: &Path) -> Result<SelectedCells, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    selection_from_str(&content, delimiter)
}

pub fn selection_from_str(content: &str, delimiter: u8) -> Result<SelectedCells, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Err("file has no header row".to_string()),
    };

    // Column ids are positional so repeated header text stays addressable
    let fields: Vec<FieldDescriptor> = header
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let label = label.trim();
            let label = if label.is_empty() {
                format!("Column{}", idx + 1)
            } else {
                label.to_string()
            };
            FieldDescriptor::new(format!("c{}", idx), label)
        })
        .collect();
    let width = fields.len();

    let mut cells = SelectedCells::new(fields);
    for (idx, result) in records.enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        let mut values: Vec<Option<String>> = record
            .iter()
            .take(width)
            .map(|field| Some(field.to_string()))
            .collect();
        values.resize(width, None);
        cells.push_row(idx as RowId + 1, values);
    }

    Ok(cells)
}

const CANDIDATE_DELIMITERS: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_LINES: usize = 10;

/// Outcome of delimiter detection over the first lines of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterGuess {
    pub delimiter: u8,
    /// Fields on the header line; 1 when no candidate splits it
    pub columns: usize,
    /// Sampled lines with the same field count as the header line
    pub consistent_lines: usize,
    pub sampled_lines: usize,
    /// Another candidate scored exactly as well
    pub tied_with: Option<u8>,
}

impl DelimiterGuess {
    /// True when the file may be split into the wrong columns.
    pub fn is_ambiguous(&self) -> bool {
        self.tied_with.is_some() || (self.columns > 1 && self.consistent_lines < self.sampled_lines)
    }
}

/// Score each candidate delimiter (tab, semicolon, comma, pipe) by how many
/// sampled lines agree with the header's field count, weighted by that count.
/// A candidate must split the header line to count at all; with no winner
/// the file is read as a single comma-separated column.
pub fn guess_delimiter(content: &str) -> DelimiterGuess {
    let sample: Vec<&str> = content.lines().take(SNIFF_LINES).collect();
    let mut guess = DelimiterGuess {
        delimiter: b',',
        columns: 1,
        consistent_lines: sample.len(),
        sampled_lines: sample.len(),
        tied_with: None,
    };
    let mut best_score = 0;

    for delim in CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = sample.iter().map(|line| field_count(line, delim)).collect();
        let columns = counts.first().copied().unwrap_or(0);
        if columns <= 1 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == columns).count();
        let score = consistent * columns;

        if score > best_score {
            best_score = score;
            guess = DelimiterGuess {
                delimiter: delim,
                columns,
                consistent_lines: consistent,
                sampled_lines: sample.len(),
                tied_with: None,
            };
        } else if score == best_score {
            guess.tied_with.get_or_insert(delim);
        }
    }

    guess
}

pub fn sniff_delimiter(content: &str) -> u8 {
    guess_delimiter(content).delimiter
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
    Ok(decode_text(bytes))
}

/// UTF-8 (BOM stripped) or, failing that, Windows-1252.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => s,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            // Excel-exported CSVs are usually Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Write a table with a header row of column labels.
pub fn write_table<W: Write>(table: &MemoryTable, writer: W, delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer
        .write_record(table.columns().iter().map(|c| c.label.as_str()))
        .map_err(|e| e.to_string())?;
    for row in table.rows() {
        writer.write_record(&row).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

pub fn export(table: &MemoryTable, path: &Path) -> Result<(), String> {
    export_with_delimiter(table, path, b',')
}

pub fn export_tsv(table: &MemoryTable, path: &Path) -> Result<(), String> {
    export_with_delimiter(table, path, b'\t')
}

fn export_with_delimiter(table: &MemoryTable, path: &Path, delimiter: u8) -> Result<(), String> {
    let file = std::fs::File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    write_table(table, std::io::BufWriter::new(file), delimiter)
}
