//! Catalog search and result output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{Days, NaiveDate};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{ConfigError, Error, Result};
use crate::geometry::Geometry;
use crate::service::{ImageService, SearchQuery, SearchRecord};

use super::collections::collection_id;

/// Column holding the image id in written results.
const ID_COLUMN: &str = "ID";

/// Descriptions of the summary properties the service reports.
const PROPERTY_LEGEND: &[(&str, &str)] = &[
    ("DATE", "Image capture date/time (UTC)"),
    ("VALID", "Portion of valid (cloud and shadow free) pixels (%)"),
    ("CLOUD_COVER", "Cloud cover reported by the provider (%)"),
    ("SCORE", "Average cloud/shadow distance quality score (m)"),
    ("SAA", "Solar azimuth angle (deg)"),
    ("SZA", "Solar zenith angle (deg)"),
    ("GEO_ACC", "Geometric accuracy (m)"),
    ("GQ", "Image quality (0-9)"),
];

/// Search parameters, before defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchArgs {
    /// Short collection name, e.g. `landsat8_c2_l2`.
    pub collection: String,
    pub start_date: NaiveDate,
    /// Defaults to the day after `start_date`.
    pub end_date: Option<NaiveDate>,
    pub region: Geometry,
    /// Minimum valid pixel percentage, `0..=100`.
    pub valid_portion: f64,
}

impl SearchArgs {
    /// Build the wire query, resolving the collection id and end date.
    pub fn to_query(&self) -> std::result::Result<SearchQuery, ConfigError> {
        let collection = collection_id(&self.collection)?;
        let end_date = match self.end_date {
            Some(end) => end,
            None => self
                .start_date
                .checked_add_days(Days::new(1))
                .ok_or_else(|| ConfigError::InvalidDateRange(self.start_date.to_string()))?,
        };
        if end_date <= self.start_date {
            return Err(ConfigError::InvalidDateRange(format!(
                "end date {} must be after start date {}",
                end_date, self.start_date
            )));
        }
        if !(0.0..=100.0).contains(&self.valid_portion) {
            return Err(ConfigError::InvalidValidPortion(self.valid_portion));
        }

        Ok(SearchQuery {
            collection: collection.to_string(),
            start_date: self.start_date,
            end_date,
            region: self.region.clone(),
            valid_portion: self.valid_portion,
        })
    }
}

/// Images returned by a search, in service order.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub query: SearchQuery,
    pub records: Vec<SearchRecord>,
}

/// Run a search.
pub fn search(service: &dyn ImageService, args: &SearchArgs) -> Result<SearchResults> {
    let query = args.to_query()?;
    info!(
        collection = %query.collection,
        start = %query.start_date,
        end = %query.end_date,
        valid_portion = query.valid_portion,
        "searching"
    );
    let records = service.search(&query)?;
    info!(count = records.len(), "search complete");
    Ok(SearchResults { query, records })
}

impl SearchResults {
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Property keys across all records, in first-seen order.
    pub fn property_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for record in &self.records {
            for key in record.properties.keys() {
                if !keys.iter().any(|k| k == key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Legend lines for the property keys that have a known description.
    pub fn legend(&self) -> Vec<(String, &'static str)> {
        self.property_keys()
            .into_iter()
            .filter_map(|key| {
                PROPERTY_LEGEND
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, description)| (key, *description))
            })
            .collect()
    }

    /// Fixed-width summary table.
    pub fn summary(&self) -> String {
        let mut header = vec![ID_COLUMN.to_string()];
        header.extend(self.property_keys());

        let rows: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|record| {
                let mut row = vec![record.id.clone()];
                row.extend(header[1..].iter().map(|key| {
                    record
                        .properties
                        .get(key)
                        .map(format_summary_value)
                        .unwrap_or_default()
                }));
                row
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|col| {
                rows.iter()
                    .map(|row| row[col].len())
                    .chain(std::iter::once(header[col].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_row = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![format_row(&header)];
        lines.extend(rows.iter().map(|row| format_row(row)));
        lines.join("\n")
    }

    /// Write results to `path` in the format its extension selects.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let format = OutputFormat::from_path(path)?;
        let io_error = |source: io::Error| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        match format {
            OutputFormat::Csv => self.write_csv(&mut writer).map_err(io_error)?,
            OutputFormat::Json => self.write_json(&mut writer).map_err(io_error)?,
        }
        writer.flush().map_err(io_error)?;
        info!(path = %path.display(), "search results written");
        Ok(())
    }

    fn write_csv<W: Write>(&self, writer: W) -> io::Result<()> {
        let keys = self.property_keys();
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = vec![ID_COLUMN.to_string()];
        header.extend(keys.iter().cloned());
        csv.write_record(&header)?;

        for record in &self.records {
            let mut row = vec![record.id.clone()];
            row.extend(keys.iter().map(|key| {
                record
                    .properties
                    .get(key)
                    .map(format_csv_value)
                    .unwrap_or_default()
            }));
            csv.write_record(&row)?;
        }
        csv.flush()
    }

    /// `{"0": {"ID": ..., ...}, "1": {...}}`
    fn write_json<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut table = Map::new();
        for (index, record) in self.records.iter().enumerate() {
            let mut row = Map::new();
            row.insert(ID_COLUMN.to_string(), Value::String(record.id.clone()));
            row.extend(record.properties.clone());
            table.insert(index.to_string(), Value::Object(row));
        }
        serde_json::to_writer(writer, &Value::Object(table)).map_err(io::Error::from)
    }
}

/// Search result file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// Select a format from a path's extension.
    pub fn from_path(path: &Path) -> std::result::Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        match extension {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::UnknownOutputExtension {
                extension: extension.to_string(),
            }),
        }
    }
}

fn format_summary_value(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| format!("{:.2}", f)).unwrap_or_default(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
