use crate::fit::FitError;
use serde::{Deserialize, Serialize};

/// Default cap on FISTA iterations, applied to every stage of the path separately.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;
/// Default relative-change tolerance of the last (smallest tau) stage.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// The sparsity weight requested by the caller.
///
/// A single value lets the path scheduler build its own continuation schedule,
/// while an explicit sequence is traversed exactly as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SparsityWeight {
    Single(f64),
    Sequence(Vec<f64>),
}

impl SparsityWeight {
    /// Checks that at least one weight is present and that all of them are finite and positive.
    pub fn validate(&self) -> Result<(), FitError> {
        let values: &[f64] = match self {
            SparsityWeight::Single(tau) => std::slice::from_ref(tau),
            SparsityWeight::Sequence(taus) => taus,
        };
        if values.is_empty() {
            return Err(FitError::InvalidArgument(
                "a sparsity weight is required but the sequence is empty".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|tau| !(tau.is_finite() && **tau > 0.0)) {
            return Err(FitError::InvalidArgument(format!(
                "sparsity weights must be finite and positive, found {bad}"
            )));
        }
        Ok(())
    }

    /// The weight the caller ultimately asked for: the last one traversed.
    pub fn target(&self) -> Option<f64> {
        match self {
            SparsityWeight::Single(tau) => Some(*tau),
            SparsityWeight::Sequence(taus) => taus.last().copied(),
        }
    }
}

impl From<f64> for SparsityWeight {
    fn from(tau: f64) -> Self {
        SparsityWeight::Single(tau)
    }
}

impl From<Vec<f64>> for SparsityWeight {
    fn from(taus: Vec<f64>) -> Self {
        SparsityWeight::Sequence(taus)
    }
}

/// Options of a sparse fit. Validated once at the entry of `fit_sparse_model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Ridge weight of the least-squares refit on the selected support.
    /// `None` disables de-biasing, `Some(0.0)` refits by ordinary least squares.
    #[serde(default)]
    pub debias_weight: Option<f64>,
    /// Strength of the L2 term, in units of the datafit Lipschitz constant.
    pub smoothing: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Center the data and estimate an intercept. When false the intercept is exactly zero.
    pub fit_offset: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            debias_weight: None,
            smoothing: 0.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            fit_offset: true,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<(), FitError> {
        if !(self.smoothing.is_finite() && self.smoothing >= 0.0) {
            return Err(FitError::InvalidArgument(format!(
                "smoothing weight must be finite and non-negative, found {}",
                self.smoothing
            )));
        }
        if self.max_iterations == 0 {
            return Err(FitError::InvalidArgument(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(FitError::InvalidArgument(format!(
                "tolerance must be finite and positive, found {}",
                self.tolerance
            )));
        }
        if let Some(weight) = self.debias_weight {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(FitError::InvalidArgument(format!(
                    "de-biasing weight must be finite and non-negative, found {weight}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations, 100_000);
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.smoothing, 0.0);
        assert!(config.fit_offset);
        assert!(config.debias_weight.is_none());
    }

    #[test]
    fn out_of_domain_options_are_rejected() {
        let negative_tolerance = FitConfig {
            tolerance: -1e-3,
            ..FitConfig::default()
        };
        assert!(matches!(
            negative_tolerance.validate(),
            Err(FitError::InvalidArgument(_))
        ));

        let zero_iterations = FitConfig {
            max_iterations: 0,
            ..FitConfig::default()
        };
        assert!(zero_iterations.validate().is_err());

        let negative_smoothing = FitConfig {
            smoothing: -0.5,
            ..FitConfig::default()
        };
        assert!(negative_smoothing.validate().is_err());

        let negative_debias = FitConfig {
            debias_weight: Some(-1.0),
            ..FitConfig::default()
        };
        assert!(negative_debias.validate().is_err());
    }

    #[test]
    fn sparsity_weights_must_be_present_and_positive() {
        assert!(SparsityWeight::Sequence(vec![]).validate().is_err());
        assert!(SparsityWeight::Single(0.0).validate().is_err());
        assert!(SparsityWeight::Single(f64::NAN).validate().is_err());
        assert!(SparsityWeight::Sequence(vec![1.0, -0.1]).validate().is_err());
        assert!(SparsityWeight::Sequence(vec![1.0, 0.1]).validate().is_ok());
        assert_eq!(SparsityWeight::from(vec![1.0, 0.1]).target(), Some(0.1));
    }
}
