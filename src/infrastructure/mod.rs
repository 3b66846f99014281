// Infrastructure layer: external input concerns

pub mod dataset;

pub use dataset::{load_insurance_csv, read_insurance_records, DatasetError};
