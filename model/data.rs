//! # Tabular data loading
//!
//! Reads tab-separated files with a header row into the `ndarray` structures
//! the solver works on. One named column is the response; every other column
//! is a feature, kept in file order. Failures are treated as user-input errors
//! and reported through `DataError`.

use ndarray::{Array1, Array2};
use std::path::Path;
use thiserror::Error;

/// Response and design matrix ready for fitting.
#[derive(Debug)]
pub struct TrainingData {
    pub feature_names: Vec<String>,
    /// Shape: [n_samples, n_features].
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

/// Design matrix ready for prediction, columns ordered as requested.
#[derive(Debug)]
pub struct PredictionData {
    pub x: Array2<f64>,
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse the tab-separated input: {0}")]
    CsvError(#[from] csv::Error),
    #[error(
        "The required column '{0}' was not found in the input file. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error("The value '{value}' in column '{column}' on data row {row} is not a finite number.")]
    NonNumericValue {
        column: String,
        row: usize,
        value: String,
    },
    #[error("The input file contains no data rows.")]
    Empty,
    #[error("The input file has no feature columns besides the response '{0}'.")]
    NoFeatures(String),
}

struct Table {
    header: Vec<String>,
    rows: Vec<Vec<f64>>,
}

fn read_table(path: &Path) -> Result<Table, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let mut values = Vec::with_capacity(header.len());
        for (column, field) in header.iter().zip(record.iter()) {
            let value = field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DataError::NonNumericValue {
                    column: column.clone(),
                    row: row_idx + 1,
                    value: field.to_string(),
                })?;
            values.push(value);
        }
        rows.push(values);
    }

    if rows.is_empty() {
        return Err(DataError::Empty);
    }
    Ok(Table { header, rows })
}

fn column_index(header: &[String], name: &str) -> Result<usize, DataError> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
}

/// Loads a training table, splitting off the `response` column.
pub fn load_training_data(path: &Path, response: &str) -> Result<TrainingData, DataError> {
    let table = read_table(path)?;
    let response_idx = column_index(&table.header, response)?;
    let feature_idx: Vec<usize> = (0..table.header.len())
        .filter(|&idx| idx != response_idx)
        .collect();
    if feature_idx.is_empty() {
        return Err(DataError::NoFeatures(response.to_string()));
    }

    let n = table.rows.len();
    let y = Array1::from_iter(table.rows.iter().map(|row| row[response_idx]));
    let x = Array2::from_shape_fn((n, feature_idx.len()), |(i, j)| {
        table.rows[i][feature_idx[j]]
    });
    let feature_names = feature_idx
        .iter()
        .map(|&idx| table.header[idx].clone())
        .collect();

    log::info!(
        "Loaded {n} samples with {} features from {}",
        feature_idx.len(),
        path.display()
    );
    Ok(TrainingData {
        feature_names,
        x,
        y,
    })
}

/// Loads the named feature columns, in the given order. Other columns are ignored.
pub fn load_prediction_data(
    path: &Path,
    feature_names: &[String],
) -> Result<PredictionData, DataError> {
    let table = read_table(path)?;
    let feature_idx = feature_names
        .iter()
        .map(|name| column_index(&table.header, name))
        .collect::<Result<Vec<_>, _>>()?;

    let x = Array2::from_shape_fn((table.rows.len(), feature_idx.len()), |(i, j)| {
        table.rows[i][feature_idx[j]]
    });
    Ok(PredictionData { x })
}
