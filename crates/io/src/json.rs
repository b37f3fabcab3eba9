// JSON export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gridmerge_engine::MemoryTable;
use serde::Serialize;

/// Table as `{ "table": name, "columns": [ids], "rows": [[values]] }`.
#[derive(Debug, Serialize)]
pub struct TableExport<'a> {
    pub table: &'a str,
    pub columns: Vec<&'a str>,
    pub rows: Vec<Vec<&'a str>>,
}

impl<'a> TableExport<'a> {
    pub fn new(table: &'a MemoryTable) -> Self {
        Self {
            table: &table.name,
            columns: table.columns().iter().map(|c| c.id.as_str()).collect(),
            rows: table.rows().collect(),
        }
    }
}

pub fn write_table<W: Write>(table: &MemoryTable, writer: W) -> Result<(), String> {
    serde_json::to_writer_pretty(writer, &TableExport::new(table)).map_err(|e| e.to_string())
}

pub fn export(table: &MemoryTable, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(file);
    write_table(table, &mut writer)?;
    writer.flush().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmerge_core::ColumnSpec;
    use gridmerge_engine::{DocumentHost, MemoryDocument};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");

        let mut doc = MemoryDocument::new();
        let columns = [ColumnSpec::text("A_Name", "A_Name"), ColumnSpec::text("A_Qty", "A_Qty")];
        let mut data = HashMap::new();
        data.insert("A_Name".to_string(), vec!["Alice".to_string(), "Bob".to_string()]);
        data.insert("A_Qty".to_string(), vec!["42".to_string(), String::new()]);
        doc.create_table_with_rows("Out", &columns, &[None, None], &data).unwrap();

        export(doc.table("Out").unwrap(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(parsed["table"], "Out");
        assert_eq!(parsed["columns"], serde_json::json!(["A_Name", "A_Qty"]));
        assert_eq!(parsed["rows"][0], serde_json::json!(["Alice", "42"]));
        assert_eq!(parsed["rows"][1], serde_json::json!(["Bob", ""]));
    }
}
