use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{ResultsTable, RowValue};

/// One named table of results, flattened to columns and rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    /// Run that produced this sheet
    pub run_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub key: String,
    /// One cell per column; `None` where the row has no value for it
    pub values: Vec<Option<f64>>,
    /// Gap reason for rows without metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Sheet {
    pub fn from_table(name: impl Into<String>, run_id: impl Into<String>, table: &ResultsTable) -> Self {
        let columns = table.columns();
        let rows = table
            .rows
            .iter()
            .map(|row| match &row.value {
                RowValue::Metrics(bundle) => SheetRow {
                    key: row.key.clone(),
                    values: columns.iter().map(|c| bundle.get(c)).collect(),
                    note: None,
                },
                RowValue::Gap(reason) => SheetRow {
                    key: row.key.clone(),
                    values: vec![None; columns.len()],
                    note: Some(reason.to_string()),
                },
            })
            .collect();

        Self {
            name: name.into(),
            run_id: run_id.into(),
            columns,
            rows,
        }
    }

    /// Cell at (`key`, `column`)
    pub fn value(&self, key: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.iter().find(|r| r.key == key)?.values[col]
    }
}

/// JSON workbook of named sheets.
///
/// Opening a missing file starts an empty workbook, so exports never depend
/// on a pre-created file. Sheet names are never overwritten: a clashing name
/// gets the smallest free numeric suffix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub updated_at: Option<String>,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse workbook: {:?}", path))
    }

    /// Add a sheet and return the name it was stored under
    pub fn add_sheet(&mut self, name: &str, run_id: &str, table: &ResultsTable) -> String {
        let name = self.free_name(name);
        self.sheets.push(Sheet::from_table(name.clone(), run_id, table));
        name
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    fn free_name(&self, name: &str) -> String {
        if self.sheet(name).is_none() {
            return name.to_string();
        }
        (1..)
            .map(|i| format!("{}{}", name, i))
            .find(|candidate| self.sheet(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    /// Write to a JSON file, creating parent directories as needed
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());

        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        info!("Wrote {} sheets to {:?}", self.sheets.len(), path);
        Ok(())
    }
}

/// Append tables to the workbook at `path`, creating it if missing
pub fn export_tables<'a, I>(path: &Path, run_id: &str, tables: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = (String, &'a ResultsTable)>,
{
    let mut workbook = Workbook::open_or_create(path)?;
    let names = tables
        .into_iter()
        .map(|(name, table)| workbook.add_sheet(&name, run_id, table))
        .collect();
    workbook.save(path)?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GapReason, MetricBundle};

    fn table() -> ResultsTable {
        let mut table = ResultsTable::new();
        table.push_metrics("40", MetricBundle::new().with("ttr", 0.5).with("n", 12.0));
        table.push_gap("45", GapReason::EmptyPopulation);
        table.push_metrics("48", MetricBundle::new().with("types", 80.0));
        table
    }

    #[test]
    fn test_sheet_flattening() {
        let sheet = Sheet::from_table("ttr", "run", &table());

        assert_eq!(sheet.columns, vec!["n", "ttr", "types"]);
        assert_eq!(sheet.value("40", "ttr"), Some(0.5));
        assert_eq!(sheet.value("48", "ttr"), None);
        assert_eq!(sheet.rows[1].note.as_deref(), Some("empty population"));
        assert!(sheet.rows[1].values.iter().all(Option::is_none));
    }

    #[test]
    fn test_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("td.json");

        let names = export_tables(&path, "run-1", [("ttr".to_string(), &table())]).unwrap();
        assert_eq!(names, vec!["ttr"]);
        assert!(path.exists());
    }

    #[test]
    fn test_appends_with_new_sheet_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("td.json");
        let t = table();

        export_tables(&path, "run-1", [("ttr".to_string(), &t)]).unwrap();
        let names = export_tables(&path, "run-2", [("ttr".to_string(), &t), ("ttr".to_string(), &t)]).unwrap();
        assert_eq!(names, vec!["ttr1", "ttr2"]);

        let workbook = Workbook::open_or_create(&path).unwrap();
        assert_eq!(workbook.sheets.len(), 3);
        assert_eq!(workbook.sheet("ttr").unwrap().run_id, "run-1");
        assert_eq!(workbook.sheet("ttr2").unwrap().run_id, "run-2");
        assert!(workbook.updated_at.is_some());
    }
}
