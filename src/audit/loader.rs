use super::record::LogRecord;
use calamine::{Data, Reader, Xlsx};
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Supported upload formats, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Csv,
    Xlsx,
}

impl LogFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(LoaderError::UnsupportedExtension { extension }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("unsupported log file extension '{extension}' (expected json, csv, or xlsx)")]
    UnsupportedExtension { extension: String },
    #[error("failed to read log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON log data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON log data must be an array of objects")]
    NotAnArray,
    #[error("JSON log entry {index} is not an object")]
    RecordNotAnObject { index: usize },
    #[error("invalid CSV log data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid XLSX workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),
    #[error("workbook contains no usable sheet")]
    EmptySheet,
    #[error("scan request must include 'logs' or 'csv' data")]
    MissingPayload,
}

/// Load an ordered record list from a file on disk, dispatching on extension.
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Vec<LogRecord>, LoaderError> {
    let path = path.as_ref();
    let format = LogFormat::from_path(path)?;
    let file = File::open(path)?;
    load_reader(format, BufReader::new(file))
}

/// Load an ordered record list from any seekable reader.
pub fn load_reader<R: Read + Seek>(
    format: LogFormat,
    reader: R,
) -> Result<Vec<LogRecord>, LoaderError> {
    match format {
        LogFormat::Json => parse_json(reader),
        LogFormat::Csv => parse_csv(reader),
        LogFormat::Xlsx => parse_workbook(reader),
    }
}

pub fn parse_json<R: Read>(reader: R) -> Result<Vec<LogRecord>, LoaderError> {
    let value: Value = serde_json::from_reader(reader)?;
    records_from_json_array(value)
}

/// Accept an already-parsed JSON value (inline API payloads take this path).
pub fn records_from_json_array(value: Value) -> Result<Vec<LogRecord>, LoaderError> {
    let entries = match value {
        Value::Array(entries) => entries,
        _ => return Err(LoaderError::NotAnArray),
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(fields) => records.push(LogRecord::new(fields)),
            _ => return Err(LoaderError::RecordNotAnObject { index }),
        }
    }

    Ok(records)
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<LogRecord>, LoaderError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for row in csv_reader.records() {
        let row = row?;
        let mut fields = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if header.is_empty() || cell.is_empty() {
                continue;
            }
            fields.insert(header.to_string(), Value::String(cell.to_string()));
        }
        records.push(LogRecord::new(fields));
    }

    Ok(records)
}

pub fn parse_workbook<R: Read + Seek>(reader: R) -> Result<Vec<LogRecord>, LoaderError> {
    let mut workbook = Xlsx::new(reader)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoaderError::EmptySheet)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_header).collect(),
        None => return Err(LoaderError::EmptySheet),
    };

    let mut records = Vec::new();
    for row in rows {
        let mut fields = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if header.is_empty() {
                continue;
            }
            if let Some(value) = cell_value(cell) {
                fields.insert(header.clone(), value);
            }
        }
        records.push(LogRecord::new(fields));
    }

    Ok(records)
}

fn cell_header(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(text) => {
            if text.is_empty() {
                None
            } else {
                Some(Value::String(text.clone()))
            }
        }
        Data::Bool(flag) => Some(Value::Bool(*flag)),
        Data::Int(number) => Some(Value::Number(Number::from(*number))),
        Data::Float(number) => Number::from_f64(*number).map(Value::Number),
        Data::DateTimeIso(stamp) => Some(Value::String(stamp.clone())),
        Data::DurationIso(duration) => Some(Value::String(duration.clone())),
        other => Some(Value::String(other.to_string())),
    }
}
