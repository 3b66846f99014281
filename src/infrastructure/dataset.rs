// Insurance dataset loading.
//
// The only external input of the system: a CSV with one row per insured
// client. The header is validated up front so a malformed file aborts
// the run before any model is built.

use std::fs::File;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::domain::records::{AttrValue, Record, RecordStore};

/// Columns every dataset must provide.
pub const REQUIRED_COLUMNS: [&str; 7] =
    ["age", "sex", "bmi", "children", "smoker", "region", "charges"];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("failed to read dataset: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse dataset: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct InsuranceRow {
    age: f64,
    sex: String,
    bmi: f64,
    children: u32,
    smoker: String,
    region: String,
    charges: f64,
}

/// Loads the insurance dataset from a CSV file.
pub fn load_insurance_csv(path: impl AsRef<Path>) -> Result<RecordStore, DatasetError> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading insurance dataset");
    let file = File::open(path)?;
    read_insurance_records(file)
}

/// Reads insurance records from any CSV reader.
pub fn read_insurance_records(reader: impl io::Read) -> Result<RecordStore, DatasetError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(DatasetError::MissingColumn(required.to_string()));
        }
    }

    let mut records = Vec::new();
    for (id, row) in csv_reader.deserialize::<InsuranceRow>().enumerate() {
        let row = row?;
        let mut attrs = IndexMap::new();
        attrs.insert("age".to_string(), AttrValue::Number(row.age));
        attrs.insert("sex".to_string(), AttrValue::Text(row.sex));
        attrs.insert("bmi".to_string(), AttrValue::Number(row.bmi));
        attrs.insert(
            "children".to_string(),
            AttrValue::Number(f64::from(row.children)),
        );
        attrs.insert("smoker".to_string(), AttrValue::Text(row.smoker));
        attrs.insert("region".to_string(), AttrValue::Text(row.region));
        attrs.insert("charges".to_string(), AttrValue::Number(row.charges));
        records.push(Record::new(id, attrs));
    }

    tracing::info!(records = records.len(), "dataset loaded");
    Ok(RecordStore::new(records))
}
