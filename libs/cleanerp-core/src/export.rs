//! Export and import of entity records

use crate::database::{check_record, ErpDatabase};
use crate::error::{CleanErpError, Result};
use crate::mapping::{map_from_db, to_db_record};
use crate::models::EntityKind;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

/// Export format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = CleanErpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(CleanErpError::validation(format!(
                "Unsupported export format: {s}"
            ))),
        }
    }
}

/// Key naming of exported and imported records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// camelCase, as the entities serialize
    #[default]
    Ui,
    /// snake_case column names, nulls dropped
    Db,
}

impl std::str::FromStr for KeyStyle {
    type Err = CleanErpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ui" | "camel" => Ok(Self::Ui),
            "db" | "snake" => Ok(Self::Db),
            _ => Err(CleanErpError::validation(format!("Unsupported key style: {s}"))),
        }
    }
}

/// Outcome of [`DataImporter::import`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub entity: &'static str,
    pub created: usize,
    pub ids: Vec<Uuid>,
}

/// Renders records as JSON or CSV
#[derive(Debug, Clone, Copy, Default)]
pub struct DataExporter {
    format: ExportFormat,
    keys: KeyStyle,
}

impl DataExporter {
    #[must_use]
    pub const fn new(format: ExportFormat, keys: KeyStyle) -> Self {
        Self { format, keys }
    }

    /// Export every record of `kind`
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be loaded or rendered
    #[instrument(skip(self, db))]
    pub async fn export_entity(&self, db: &ErpDatabase, kind: EntityKind) -> Result<String> {
        let records = db.all_records(kind).await?;
        info!("Exporting {} {} records", records.len(), kind);
        self.export(&records)
    }

    /// Render already-loaded records
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or CSV support is not compiled in
    pub fn export(&self, records: &[Value]) -> Result<String> {
        let records = match self.keys {
            KeyStyle::Ui => records.to_vec(),
            KeyStyle::Db => records
                .iter()
                .map(to_db_record)
                .collect::<Result<Vec<_>>>()?,
        };
        match self.format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&records)?),
            ExportFormat::Csv => export_csv(&records),
        }
    }
}

/// Columns in first-seen order across all records; keys within a record
/// arrive sorted
fn csv_columns(records: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Value::Object(map) = record {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(feature = "export-csv")]
fn export_csv(records: &[Value]) -> Result<String> {
    let columns = csv_columns(records);
    let mut writer = csv::Writer::from_writer(Vec::new());
    if !columns.is_empty() {
        writer
            .write_record(&columns)
            .map_err(std::io::Error::from)?;
    }
    for record in records {
        let row = columns.iter().map(|c| csv_cell(record.get(c)));
        writer.write_record(row).map_err(std::io::Error::from)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes)
        .map_err(|e| CleanErpError::unknown(format!("CSV output is not UTF-8: {e}")))
}

#[cfg(not(feature = "export-csv"))]
fn export_csv(_records: &[Value]) -> Result<String> {
    Err(CleanErpError::configuration(
        "CSV export requires the export-csv feature",
    ))
}

/// Creates records from a JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct DataImporter {
    keys: KeyStyle,
}

impl DataImporter {
    #[must_use]
    pub const fn new(keys: KeyStyle) -> Self {
        Self { keys }
    }

    /// Parse a JSON array of record objects into camelCase records
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a JSON array of objects
    pub fn parse(&self, content: &str) -> Result<Vec<Value>> {
        let Value::Array(items) = serde_json::from_str::<Value>(content)? else {
            return Err(CleanErpError::validation(
                "Import file must contain a JSON array of records",
            ));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                if !item.is_object() {
                    return Err(CleanErpError::validation(format!(
                        "Record {} is not an object",
                        i + 1
                    )));
                }
                Ok(match self.keys {
                    KeyStyle::Ui => item,
                    KeyStyle::Db => map_from_db(item),
                })
            })
            .collect()
    }

    /// Import records of `kind`.
    ///
    /// Every record is validated before the first insert. Database-level
    /// failures (missing parents, duplicate numbers) stop the import after
    /// the records created so far.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first failing record
    #[instrument(skip(self, db, content))]
    pub async fn import(
        &self,
        db: &ErpDatabase,
        kind: EntityKind,
        content: &str,
    ) -> Result<ImportSummary> {
        let records = self.parse(content)?;
        for (i, record) in records.iter().enumerate() {
            check_record(kind, record).map_err(|e| e.in_record(i + 1))?;
        }

        let mut ids = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let created = db
                .create_record(kind, record)
                .await
                .map_err(|e| e.in_record(i + 1))?;
            if let Some(id) = created.get("id").and_then(Value::as_str) {
                ids.push(id.parse().map_err(|_| CleanErpError::InvalidUuid {
                    uuid: id.to_string(),
                })?);
            }
        }

        info!("Imported {} {} records", ids.len(), kind);
        Ok(ImportSummary {
            entity: kind.as_str(),
            created: ids.len(),
            ids,
        })
    }
}
