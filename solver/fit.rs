// solver/fit.rs

//! # Sparse least-squares fitting with continuation
//!
//! This module sequences the numeric pieces of the crate into one fit:
//!
//! 1.  **Centering:** the intercept is profiled out by removing column and
//!     response means (or not at all when the offset is disabled).
//! 2.  **Continuation:** the requested sparsity weight is reached through a
//!     decreasing sequence of weights, each stage warm-started from the last.
//!     Intermediate stages run with a loose tolerance.
//! 3.  **Degeneracy fallback:** under a pure L1 penalty, once a stage selects at
//!     least as many variables as there are samples the remaining stages are
//!     abandoned for an ordinary least-squares fit on every column.
//! 4.  **De-biasing:** an optional least-squares refit on the selected support.
//!
//! Every stage finishes (converged or out of iterations) before the next one
//! starts, since each warm start depends on the previous solution.

use crate::centering::{CenteredData, center};
use crate::config::{FitConfig, SparsityWeight};
use crate::debias::{debias_on_support, solve_least_squares};
use crate::fista::{SmoothPart, StageStatus, run_stage};
use crate::lipschitz::datafit_lipschitz;
use crate::path::{PathStage, build_path};
use ndarray::{Array1, ArrayView1, ArrayView2};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("The design matrix has {rows} rows but the response has {len} entries.")]
    DimensionMismatch { rows: usize, len: usize },

    #[error("Singular value decomposition of the design matrix failed: {0}")]
    SpectralNormFailed(ndarray_linalg::error::LinalgError),

    #[error("A linear system solve failed during the least-squares refit: {0}")]
    LinearSystemSolveFailed(ndarray_linalg::error::LinalgError),
}

/// Summary of one traversed stage.
#[derive(Clone, Debug, PartialEq)]
pub struct StageRecord {
    pub tau: f64,
    pub tolerance: f64,
    pub iterations: usize,
    pub status: StageStatus,
    /// Number of non-zero coefficients after the stage.
    pub selected: usize,
}

/// How the continuation loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathTermination {
    /// Every stage of the path ran.
    Completed,
    /// Stage `stage` (zero based) was reached with `selected >= n` under a pure
    /// L1 penalty; the coefficients are an unpenalized least-squares fit.
    DegenerateFallback { stage: usize, selected: usize },
}

/// Result of [`fit_sparse_model`].
#[derive(Clone, Debug)]
pub struct SparseFit {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    /// Total FISTA iterations over all stages.
    pub iterations: usize,
    pub stages: Vec<StageRecord>,
    pub termination: PathTermination,
    /// Whether the coefficients come from the de-biasing refit.
    pub debiased: bool,
}

impl SparseFit {
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }

    pub fn selected(&self) -> usize {
        count_selected(self.coefficients.view())
    }
}

fn count_selected(beta: ArrayView1<f64>) -> usize {
    beta.iter().filter(|b| **b != 0.0).count()
}

/// Value of the penalized objective on centered data `x`, `y`:
/// `(1/2n)||y - X b||^2 + (smoothing * l0 / 2)||b||^2 + tau ||b||_1`.
pub fn penalized_objective<'a>(
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    beta: ArrayView1<f64>,
    tau: f64,
    smoothing: f64,
    l0: f64,
) -> f64 {
    let smooth = SmoothPart::new(x, y, smoothing * l0);
    smooth.value(beta) + tau * beta.iter().map(|b| b.abs()).sum::<f64>()
}

fn validate_inputs(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    weight: &SparsityWeight,
    config: &FitConfig,
) -> Result<(), FitError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(FitError::InvalidArgument(format!(
            "the design matrix must have at least one row and one column, got {:?}",
            x.shape()
        )));
    }
    if y.is_empty() {
        return Err(FitError::InvalidArgument(
            "the response vector is empty".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(FitError::DimensionMismatch {
            rows: x.nrows(),
            len: y.len(),
        });
    }
    if !x.iter().all(|v| v.is_finite()) {
        return Err(FitError::InvalidArgument(
            "the design matrix contains non-finite values".to_string(),
        ));
    }
    if !y.iter().all(|v| v.is_finite()) {
        return Err(FitError::InvalidArgument(
            "the response vector contains non-finite values".to_string(),
        ));
    }
    weight.validate()?;
    config.validate()
}

/// Fits a sparse linear model of `y` on `x` at sparsity weight `weight`.
///
/// Returns the coefficients on the original scale of `x`, the intercept
/// (exactly zero when `config.fit_offset` is false) and the total number of
/// FISTA iterations, together with a per-stage trace of the continuation path.
pub fn fit_sparse_model(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    weight: &SparsityWeight,
    config: &FitConfig,
) -> Result<SparseFit, FitError> {
    validate_inputs(x, y, weight, config)?;

    let (n, d) = x.dim();
    log::info!(
        "Starting sparse fit: {n} samples, {d} features, target tau {:?}, smoothing {}",
        weight.target(),
        config.smoothing
    );

    let data = center(x, y, config.fit_offset);
    let l0 = datafit_lipschitz(data.x.view())?;

    if l0 == 0.0 {
        log::warn!("Every column of the design is constant; returning the all-zero model");
        return Ok(SparseFit {
            coefficients: Array1::zeros(d),
            intercept: data.intercept(Array1::zeros(d).view()),
            iterations: 0,
            stages: Vec::new(),
            termination: PathTermination::Completed,
            debiased: false,
        });
    }

    let path = build_path(
        weight,
        data.x.view(),
        data.y.view(),
        config.tolerance,
        config.max_iterations,
    );
    log::info!("Continuation path with {} stages, L0 = {l0:.6e}", path.len());

    let (beta, stages, termination) = traverse_path(&data, &path.stages, l0, config)?;
    let iterations: usize = stages.iter().map(|s| s.iterations).sum();

    let (coefficients, debiased) = match (config.debias_weight, termination) {
        (Some(debias_weight), PathTermination::Completed) => {
            let refit = debias_on_support(
                data.x.view(),
                data.y.view(),
                beta.view(),
                Some(debias_weight),
            )?;
            (refit, true)
        }
        (Some(_), PathTermination::DegenerateFallback { .. }) => {
            log::info!("Skipping de-biasing: the degeneracy fallback already refit every column");
            (beta, false)
        }
        (None, _) => (beta, false),
    };

    let intercept = data.intercept(coefficients.view());
    log::info!(
        "Sparse fit finished: {} of {d} coefficients selected, {iterations} iterations",
        count_selected(coefficients.view())
    );

    Ok(SparseFit {
        coefficients,
        intercept,
        iterations,
        stages,
        termination,
        debiased,
    })
}

type PathOutcome = (Array1<f64>, Vec<StageRecord>, PathTermination);

/// Walks the continuation stages with warm restarts, switching to the
/// unpenalized refit when the pure-L1 problem degenerates.
fn traverse_path(
    data: &CenteredData,
    stages: &[PathStage],
    l0: f64,
    config: &FitConfig,
) -> Result<PathOutcome, FitError> {
    let n = data.x.nrows();
    let lipschitz = l0 * (1.0 + config.smoothing);
    let step = 1.0 / lipschitz;
    let smooth = SmoothPart::new(data.x.view(), data.y.view(), config.smoothing * l0);

    let mut beta = Array1::zeros(data.x.ncols());
    let mut selected = 0usize;
    let mut records = Vec::with_capacity(stages.len());

    for (idx, stage) in stages.iter().enumerate() {
        if config.smoothing == 0.0 && selected >= n {
            log::warn!(
                "Stage {idx}: {selected} variables selected with only {n} samples; \
                 abandoning the path for an unpenalized least-squares fit"
            );
            let dense = solve_least_squares(data.x.view(), data.y.view(), None)?;
            return Ok((
                dense,
                records,
                PathTermination::DegenerateFallback {
                    stage: idx,
                    selected,
                },
            ));
        }

        let result = run_stage(
            &smooth,
            beta,
            stage.tau,
            step,
            stage.tolerance,
            stage.max_iterations,
        );
        beta = result.beta;
        selected = count_selected(beta.view());

        log::debug!(
            "Stage {idx}: tau={:.4e} tol={:.1e} -> {:?} after {} iterations, {selected} selected",
            stage.tau,
            stage.tolerance,
            result.status,
            result.iterations
        );
        records.push(StageRecord {
            tau: stage.tau,
            tolerance: stage.tolerance,
            iterations: result.iterations,
            status: result.status,
            selected,
        });
    }

    Ok((beta, records, PathTermination::Completed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    #[test]
    fn mismatched_rows_are_rejected() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![1.0, 2.0, 3.0];
        let err = fit_sparse_model(
            x.view(),
            y.view(),
            &SparsityWeight::Single(0.1),
            &FitConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::DimensionMismatch { rows: 2, len: 3 }));
    }

    #[test]
    fn missing_sparsity_weight_is_an_invalid_argument() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        let err = fit_sparse_model(
            x.view(),
            y.view(),
            &SparsityWeight::Sequence(Vec::new()),
            &FitConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::InvalidArgument(_)));
    }

    #[test]
    fn empty_design_is_an_invalid_argument() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        let err = fit_sparse_model(
            x.view(),
            y.view(),
            &SparsityWeight::Single(0.1),
            &FitConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::InvalidArgument(_)));
    }

    #[test]
    fn non_finite_data_is_rejected() {
        let x = array![[1.0], [f64::NAN]];
        let y = array![1.0, 2.0];
        let result = fit_sparse_model(
            x.view(),
            y.view(),
            &SparsityWeight::Single(0.1),
            &FitConfig::default(),
        );
        assert!(matches!(result, Err(FitError::InvalidArgument(_))));
    }

    #[test]
    fn constant_columns_give_the_mean_model() {
        let x = array![[2.0, 1.0], [2.0, 1.0], [2.0, 1.0]];
        let y = array![1.0, 2.0, 6.0];
        let fit = fit_sparse_model(
            x.view(),
            y.view(),
            &SparsityWeight::Single(0.1),
            &FitConfig::default(),
        )
        .unwrap();
        assert!(fit.coefficients.iter().all(|&b| b == 0.0));
        assert_abs_diff_eq!(fit.intercept, 3.0, epsilon = 1e-12);
        assert_eq!(fit.iterations, 0);
    }

    #[test]
    fn iteration_total_is_the_sum_over_stages() {
        let x = array![[1.0, 0.2], [0.1, 1.0], [1.0, 1.1], [0.3, -0.4]];
        let y = array![1.0, 1.2, 2.1, -0.2];
        let fit = fit_sparse_model(
            x.view(),
            y.view(),
            &SparsityWeight::Single(0.01),
            &FitConfig::default(),
        )
        .unwrap();
        assert_eq!(fit.termination, PathTermination::Completed);
        assert_eq!(
            fit.iterations,
            fit.stages.iter().map(|s| s.iterations).sum::<usize>()
        );
        assert!(fit.iterations > 0);
    }

    #[test]
    fn smoothing_lowers_coefficient_norm() {
        let x = array![[1.0, 0.2], [0.1, 1.0], [1.0, 1.1], [0.3, -0.4], [0.5, 0.5]];
        let y = array![1.0, 1.2, 2.1, -0.2, 1.0];
        let weight = SparsityWeight::Single(1e-3);
        let plain = fit_sparse_model(x.view(), y.view(), &weight, &FitConfig::default()).unwrap();
        let smoothed = fit_sparse_model(
            x.view(),
            y.view(),
            &weight,
            &FitConfig {
                smoothing: 1.0,
                ..FitConfig::default()
            },
        )
        .unwrap();
        let norm = |b: &Array1<f64>| b.dot(b).sqrt();
        assert!(norm(&smoothed.coefficients) < norm(&plain.coefficients));
    }

    #[test]
    fn objective_adds_penalties_to_datafit() {
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = array![1.0, 1.0];
        let beta = array![1.0, -1.0];
        // residual (0, 2): datafit 0.5 * 4 / 2 = 1; ridge 0.5 * 2 * 2 = 2; l1 0.5 * 2 = 1
        let value = penalized_objective(x.view(), y.view(), beta.view(), 0.5, 1.0, 2.0);
        assert_abs_diff_eq!(value, 4.0, epsilon = 1e-12);
    }
}
