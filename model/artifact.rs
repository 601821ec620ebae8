use crate::config::FitConfig;
use crate::fista::StageStatus;
use crate::fit::{PathTermination, SparseFit};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

// --- Public Data Structures ---
// These structs define the human-readable TOML form of a fitted model.

/// One stage of the continuation path as stored in the model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub tau: f64,
    pub tolerance: f64,
    pub iterations: usize,
    pub converged: bool,
    pub selected: usize,
}

/// A selected feature and its coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub feature: String,
    pub value: f64,
}

/// The self-contained fitted model saved to and loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Canonical feature order; prediction data is read in this order.
    pub feature_names: Vec<String>,
    pub intercept: f64,
    /// Full coefficient vector, aligned with `feature_names`.
    pub coefficients: Vec<f64>,
    pub iterations: usize,
    pub debiased: bool,
    /// Set when the path ended in the unpenalized least-squares fallback.
    #[serde(default)]
    pub degenerate_fallback: bool,
    pub config: FitConfig,
    #[serde(default)]
    pub stages: Vec<StageSummary>,
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Prediction data has {found} feature columns, but the model was trained on {expected}.")]
    MismatchedFeatureCount { found: usize, expected: usize },
    #[error("The model has {coefficients} coefficients but {names} feature names.")]
    InconsistentModel { coefficients: usize, names: usize },
}

impl TrainedModel {
    pub fn from_fit(fit: &SparseFit, feature_names: Vec<String>, config: FitConfig) -> Self {
        let stages = fit
            .stages
            .iter()
            .map(|stage| StageSummary {
                tau: stage.tau,
                tolerance: stage.tolerance,
                iterations: stage.iterations,
                converged: stage.status == StageStatus::Converged,
                selected: stage.selected,
            })
            .collect();
        Self {
            feature_names,
            intercept: fit.intercept,
            coefficients: fit.coefficients.to_vec(),
            iterations: fit.iterations,
            debiased: fit.debiased,
            degenerate_fallback: matches!(
                fit.termination,
                PathTermination::DegenerateFallback { .. }
            ),
            config,
            stages,
        }
    }

    /// Non-zero coefficients with their feature names, in feature order.
    pub fn selected_features(&self) -> Vec<Coefficient> {
        self.feature_names
            .iter()
            .zip(self.coefficients.iter())
            .filter(|(_, value)| **value != 0.0)
            .map(|(feature, value)| Coefficient {
                feature: feature.clone(),
                value: *value,
            })
            .collect()
    }

    /// `X b + intercept` for a design whose columns follow `feature_names`.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        if x.ncols() != self.coefficients.len() {
            return Err(ModelError::MismatchedFeatureCount {
                found: x.ncols(),
                expected: self.coefficients.len(),
            });
        }
        let beta = Array1::from_vec(self.coefficients.clone());
        Ok(x.dot(&beta) + self.intercept)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text)?;
        log::info!("Model written to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path)?;
        let model: TrainedModel = toml::from_str(&text)?;
        if model.coefficients.len() != model.feature_names.len() {
            return Err(ModelError::InconsistentModel {
                coefficients: model.coefficients.len(),
                names: model.feature_names.len(),
            });
        }
        Ok(model)
    }
}
