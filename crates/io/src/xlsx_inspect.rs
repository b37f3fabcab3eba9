//! Lightweight XLSX/XLSM inspection for import validation.
//!
//! Reads only what validation needs out of the zip container: the sheet list
//! from `xl/workbook.xml` (resolved through `xl/_rels/workbook.xml.rels`) and
//! the number of `<mergeCell>` elements on each worksheet. Cell data is never
//! parsed.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use zip::ZipArchive;

const WORKBOOK_PATH: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    /// Part path inside the container, when it could be resolved
    pub part: Option<String>,
    pub merged_cells: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkbookSummary {
    pub sheets: Vec<SheetSummary>,
}

impl WorkbookSummary {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Sheet names that occur more than once (case-insensitive, as Excel compares them).
    pub fn duplicate_sheet_names(&self) -> Vec<&str> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut dupes = Vec::new();
        for sheet in &self.sheets {
            let count = seen.entry(sheet.name.to_lowercase()).or_insert(0);
            *count += 1;
            if *count == 2 {
                dupes.push(sheet.name.as_str());
            }
        }
        dupes
    }

    pub fn merged_sheets(&self) -> impl Iterator<Item = &SheetSummary> {
        self.sheets.iter().filter(|s| s.merged_cells > 0)
    }
}

/// Inspect an in-memory XLSX/XLSM file.
pub fn inspect_xlsx(bytes: &[u8]) -> Result<WorkbookSummary, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("not a valid spreadsheet container: {}", e))?;

    let workbook_xml = read_zip_file(&mut archive, WORKBOOK_PATH)
        .ok_or_else(|| format!("missing {}", WORKBOOK_PATH))?;
    let declared = parse_workbook_sheets(&workbook_xml)?;

    let rels = read_zip_file(&mut archive, WORKBOOK_RELS_PATH)
        .map(|xml| parse_relationships(&xml))
        .unwrap_or_default();

    let mut sheets = Vec::with_capacity(declared.len());
    for (name, rid) in declared {
        let part = rid
            .and_then(|rid| rels.get(&rid))
            .map(|target| resolve_target(target));
        let merged_cells = match part.as_deref() {
            Some(path) => read_zip_file(&mut archive, path)
                .map(|xml| count_merge_cells(&xml))
                .unwrap_or(0),
            None => 0,
        };
        sheets.push(SheetSummary {
            name,
            part,
            merged_cells,
        });
    }

    tracing::debug!(sheets = sheets.len(), "inspected workbook");
    Ok(WorkbookSummary { sheets })
}

/// Read a file from a ZIP archive, returning None on error.
fn read_zip_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Option<String> {
    let mut file = archive.by_name(path).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

/// `(name, r:id)` of every `<sheet>` in workbook order.
fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, Option<String>)>, String> {
    let mut sheets = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                let mut name = None;
                let mut rid = None;
                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                    match attr.key.as_ref() {
                        b"name" => name = Some(value),
                        b"r:id" => rid = Some(value),
                        _ => {}
                    }
                }
                if let Some(name) = name {
                    sheets.push((name, rid));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("{} is not valid XML: {}", WORKBOOK_PATH, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn parse_relationships(xml: &str) -> HashMap<String, String> {
    let mut rid_to_target = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Target" => {
                            target = Some(String::from_utf8_lossy(&attr.value).to_string())
                        }
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rid_to_target.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    rid_to_target
}

fn count_merge_cells(xml: &str) -> usize {
    let mut count = 0;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"mergeCell" =>
            {
                count += 1;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "stopped counting merged cells");
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};

    fn workbook_bytes(build: impl FnOnce(&mut Workbook)) -> Vec<u8> {
        let mut workbook = Workbook::new();
        build(&mut workbook);
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_sheet_names_in_order() {
        let bytes = workbook_bytes(|wb| {
            wb.add_worksheet().set_name("Sales").unwrap();
            wb.add_worksheet().set_name("R&D").unwrap();
        });
        let summary = inspect_xlsx(&bytes).unwrap();
        assert_eq!(summary.sheet_names(), vec!["Sales", "R&D"]);
        assert_eq!(summary.sheets[0].part.as_deref(), Some("xl/worksheets/sheet1.xml"));
        assert!(summary.duplicate_sheet_names().is_empty());
    }

    #[test]
    fn test_counts_merged_cells() {
        let bytes = workbook_bytes(|wb| {
            let ws = wb.add_worksheet();
            ws.set_name("Report").unwrap();
            let format = Format::new();
            ws.merge_range(0, 0, 0, 3, "Title", &format).unwrap();
            ws.merge_range(2, 0, 3, 0, "Side", &format).unwrap();
            wb.add_worksheet().set_name("Plain").unwrap();
        });
        let summary = inspect_xlsx(&bytes).unwrap();
        assert_eq!(summary.sheets[0].merged_cells, 2);
        assert_eq!(summary.sheets[1].merged_cells, 0);
        let merged: Vec<&str> = summary.merged_sheets().map(|s| s.name.as_str()).collect();
        assert_eq!(merged, vec!["Report"]);
    }

    #[test]
    fn test_not_a_zip() {
        let err = inspect_xlsx(b"Name,Qty\nA,1\n").unwrap_err();
        assert!(err.contains("container"));
    }

    #[test]
    fn test_zip_without_workbook() {
        use std::io::Write;
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("hello.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"hi").unwrap();
            zip.finish().unwrap();
        }
        let err = inspect_xlsx(buf.get_ref()).unwrap_err();
        assert!(err.contains("xl/workbook.xml"));
    }

    #[test]
    fn test_duplicate_names_case_insensitive() {
        let summary = WorkbookSummary {
            sheets: vec![
                SheetSummary { name: "Data".into(), part: None, merged_cells: 0 },
                SheetSummary { name: "DATA".into(), part: None, merged_cells: 0 },
                SheetSummary { name: "data".into(), part: None, merged_cells: 0 },
            ],
        };
        assert_eq!(summary.duplicate_sheet_names(), vec!["DATA"]);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }
}
