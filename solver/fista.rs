//! # Accelerated proximal gradient (FISTA) for one sparsity weight
//!
//! Minimizes `(1/2n) * ||y - X b||^2 + (ridge/2) * ||b||^2 + tau * ||b||_1` from a
//! warm start. The iteration state is a small record threaded through
//! [`FistaState::advance`], so a single stage can be driven and tested without
//! the continuation path around it.
//!
//! Reference: Beck & Teboulle (2009), "A fast iterative shrinkage-thresholding
//! algorithm for linear inverse problems", SIAM J. Imaging Sciences 2(1).

use crate::prox::proximal_step;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// State of a FISTA stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStatus {
    /// Still iterating.
    Running,
    /// The relative change between successive iterates fell below the tolerance.
    Converged,
    /// The iteration budget ran out; the last iterate is returned as is.
    MaxIterationsReached,
}

/// The differentiable part of the objective: least-squares datafit plus the
/// optional quadratic (ridge) term.
#[derive(Clone, Copy, Debug)]
pub struct SmoothPart<'a> {
    pub x: ArrayView2<'a, f64>,
    pub y: ArrayView1<'a, f64>,
    /// Absolute ridge weight, i.e. the smoothing weight times the datafit Lipschitz constant.
    pub ridge: f64,
}

impl<'a> SmoothPart<'a> {
    pub fn new(x: ArrayView2<'a, f64>, y: ArrayView1<'a, f64>, ridge: f64) -> Self {
        Self { x, y, ridge }
    }

    /// `X'(X b - y) / n + ridge * b`
    pub fn gradient(&self, beta: ArrayView1<f64>) -> Array1<f64> {
        let n = self.x.nrows() as f64;
        let residual = self.x.dot(&beta) - &self.y;
        let mut grad = self.x.t().dot(&residual) / n;
        if self.ridge > 0.0 {
            grad.scaled_add(self.ridge, &beta);
        }
        grad
    }

    pub fn value(&self, beta: ArrayView1<f64>) -> f64 {
        let n = self.x.nrows() as f64;
        let residual = &self.y - &self.x.dot(&beta);
        0.5 * residual.dot(&residual) / n + 0.5 * self.ridge * beta.dot(&beta)
    }
}

/// Mutable iterate/momentum record of one stage.
#[derive(Clone, Debug)]
pub struct FistaState {
    /// The latest proximal iterate; this is what a stage returns.
    pub iterate: Array1<f64>,
    /// Extrapolated point at which the next gradient is taken.
    pub momentum: Array1<f64>,
    /// Momentum coefficient, starts at 1 and increases monotonically.
    pub t: f64,
    pub iterations: usize,
    /// Relative change measured by the last iteration.
    pub last_change: f64,
}

impl FistaState {
    pub fn new(warm_start: Array1<f64>) -> Self {
        Self {
            momentum: warm_start.clone(),
            iterate: warm_start,
            t: 1.0,
            iterations: 0,
            last_change: f64::INFINITY,
        }
    }

    /// Runs one accelerated proximal-gradient iteration.
    ///
    /// Returns `Converged` when `||x_k - x_{k-1}|| <= tolerance * ||x_{k-1}||`
    /// (an unchanged iterate always counts), `Running` otherwise. The iteration
    /// budget is enforced by the caller.
    pub fn advance(
        &mut self,
        smooth: &SmoothPart<'_>,
        tau: f64,
        step: f64,
        tolerance: f64,
    ) -> StageStatus {
        let gradient = smooth.gradient(self.momentum.view());
        let candidate = proximal_step(self.momentum.view(), gradient.view(), step, tau);

        let t_next = 0.5 * (1.0 + (1.0 + 4.0 * self.t * self.t).sqrt());
        let extrapolation = (self.t - 1.0) / t_next;

        let difference = &candidate - &self.iterate;
        let mut momentum = candidate.clone();
        momentum.scaled_add(extrapolation, &difference);

        let change_norm = difference.dot(&difference).sqrt();
        let previous_norm = self.iterate.dot(&self.iterate).sqrt();
        self.last_change = if change_norm == 0.0 {
            0.0
        } else {
            change_norm / previous_norm
        };

        self.iterate = candidate;
        self.momentum = momentum;
        self.t = t_next;
        self.iterations += 1;

        if change_norm == 0.0 || change_norm <= tolerance * previous_norm {
            StageStatus::Converged
        } else {
            StageStatus::Running
        }
    }
}

/// Outcome of one stage of the continuation path.
#[derive(Clone, Debug)]
pub struct StageResult {
    pub beta: Array1<f64>,
    pub iterations: usize,
    pub status: StageStatus,
    pub last_change: f64,
}

/// Runs FISTA at a fixed `tau` until convergence or `max_iterations`.
///
/// `step` must not exceed the inverse Lipschitz constant of `smooth`.
pub fn run_stage(
    smooth: &SmoothPart<'_>,
    warm_start: Array1<f64>,
    tau: f64,
    step: f64,
    tolerance: f64,
    max_iterations: usize,
) -> StageResult {
    let mut state = FistaState::new(warm_start);
    let mut status = StageStatus::Running;

    while status == StageStatus::Running {
        status = state.advance(smooth, tau, step, tolerance);
        if status == StageStatus::Running && state.iterations >= max_iterations {
            status = StageStatus::MaxIterationsReached;
        }
    }

    if status == StageStatus::MaxIterationsReached {
        log::warn!(
            "FISTA stage at tau={tau:.4e} stopped after {} iterations with relative change {:.3e} (tolerance {tolerance:.1e})",
            state.iterations,
            state.last_change
        );
    }

    StageResult {
        beta: state.iterate,
        iterations: state.iterations,
        status,
        last_change: state.last_change,
    }
}
