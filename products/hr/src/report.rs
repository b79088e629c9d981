use std::io::Write;
use std::path::PathBuf;

use platform_db::Frame;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::{CatalogError, CatalogResult};

const SEPARATOR: &str = "----------------------------------------";

/// One catalog result, ready for the console and optionally for a JSON file.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSection {
    pub title: String,
    /// Name-keyed objects; key order follows the producing struct or frame.
    pub rows: Vec<Value>,
    pub export: Option<&'static str>,
}

impl ReportSection {
    pub fn from_rows<T: Serialize>(title: impl Into<String>, rows: &[T]) -> CatalogResult<Self> {
        let rows = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            title: title.into(),
            rows,
            export: None,
        })
    }

    pub fn from_optional<T: Serialize>(
        title: impl Into<String>,
        row: Option<&T>,
    ) -> CatalogResult<Self> {
        Self::from_rows(title, row.as_slice())
    }

    pub fn from_frame(title: impl Into<String>, frame: &Frame) -> CatalogResult<Self> {
        let mut rows = Vec::with_capacity(frame.len());
        for cells in frame.rows() {
            let mut object = Map::new();
            for (column, cell) in frame.columns().iter().zip(cells) {
                object.insert(column.clone(), serde_json::to_value(cell)?);
            }
            rows.push(Value::Object(object));
        }
        Ok(Self {
            title: title.into(),
            rows,
            export: None,
        })
    }

    pub fn exported_as(mut self, file_name: Option<&'static str>) -> Self {
        self.export = file_name;
        self
    }
}

/// Prints sections and writes the exported ones under `output_dir`.
#[derive(Clone, Debug)]
pub struct Reporter {
    output_dir: PathBuf,
}

impl Reporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn render<W: Write>(&self, section: &ReportSection, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", section.title)?;
        if section.rows.is_empty() {
            writeln!(out, "(no result)")?;
        }
        for row in &section.rows {
            match row {
                Value::Object(fields) => {
                    let line = fields
                        .iter()
                        .map(|(key, value)| format!("{key}: {}", display_value(value)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(out, "{line}")?;
                }
                other => writeln!(out, "{}", display_value(other))?,
            }
        }
        writeln!(out, "{SEPARATOR}")
    }

    /// Write the section's rows as pretty-printed JSON. Returns the path, or
    /// `None` when the section is not exported.
    pub fn write_json(&self, section: &ReportSection) -> CatalogResult<Option<PathBuf>> {
        let Some(file_name) = section.export else {
            return Ok(None);
        };
        let path = self.output_dir.join(file_name);
        let body = serde_json::to_string_pretty(&section.rows)?;
        std::fs::create_dir_all(&self.output_dir)
            .and_then(|()| std::fs::write(&path, body))
            .map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "report written");
        Ok(Some(path))
    }

    /// Render to stdout and write the JSON export, if any.
    pub fn emit(&self, section: &ReportSection) -> CatalogResult<()> {
        let stdout = std::io::stdout();
        self.render(section, &mut stdout.lock())
            .map_err(|source| CatalogError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
        self.write_json(section)?;
        Ok(())
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
