use crate::config::SparsityWeight;
use ndarray::{ArrayView1, ArrayView2};

/// Number of sparsity weights in an automatically built continuation path.
pub const PATH_LENGTH: usize = 10;
/// Intermediate stages are only warm starts and run with a looser tolerance.
pub const INTERMEDIATE_TOLERANCE_FACTOR: f64 = 100.0;

/// One stage of the continuation path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathStage {
    pub tau: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

/// Ordered stages, traversed first to last. The last stage carries the
/// caller's sparsity weight and tolerance.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuationPath {
    pub stages: Vec<PathStage>,
}

impl ContinuationPath {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn from_taus(taus: &[f64], tolerance: f64, max_iterations: usize) -> Self {
        let last = taus.len().saturating_sub(1);
        let stages = taus
            .iter()
            .enumerate()
            .map(|(idx, &tau)| PathStage {
                tau,
                tolerance: if idx == last {
                    tolerance
                } else {
                    tolerance * INTERMEDIATE_TOLERANCE_FACTOR
                },
                max_iterations,
            })
            .collect();
        Self { stages }
    }
}

/// Smallest sparsity weight for which the all-zero vector is optimal:
/// `||X'y||_inf / n`. Expects centered data when an intercept is fitted.
pub fn estimate_tau_max(x: ArrayView2<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.nrows() as f64;
    x.t().dot(&y).iter().fold(0.0_f64, |acc, &v| acc.max(v.abs())) / n
}

/// Geometric progression from `start` down to `end`, endpoints exact.
fn geometric_sequence(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![end];
    }
    let ratio = end / start;
    let last = (count - 1) as f64;
    (0..count)
        .map(|k| match k {
            0 => start,
            k if k == count - 1 => end,
            k => start * ratio.powf(k as f64 / last),
        })
        .collect()
}

/// Builds the sequence of stages to traverse for `weight`.
///
/// A single weight below `tau_max` is reached through [`PATH_LENGTH`]
/// geometrically spaced weights starting at `tau_max`; a weight at or above
/// `tau_max` needs no continuation. Explicit sequences are used as given.
pub fn build_path(
    weight: &SparsityWeight,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    tolerance: f64,
    max_iterations: usize,
) -> ContinuationPath {
    let taus = match weight {
        SparsityWeight::Sequence(taus) => taus.clone(),
        SparsityWeight::Single(tau) => {
            let tau_max = estimate_tau_max(x, y);
            log::debug!("Estimated tau_max = {tau_max:.6e} for requested tau = {tau:.6e}");
            if tau_max < *tau {
                vec![*tau]
            } else {
                geometric_sequence(tau_max, *tau, PATH_LENGTH)
            }
        }
    };
    ContinuationPath::from_taus(&taus, tolerance, max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn tau_max_is_scaled_sup_norm_of_correlation() {
        let x = array![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0]];
        let y = array![1.0, -3.0, 0.0];
        // X'y = (1, -6)
        assert_abs_diff_eq!(estimate_tau_max(x.view(), y.view()), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn single_weight_above_tau_max_has_one_stage() {
        let x = array![[1.0], [-1.0]];
        let y = array![1.0, -1.0];
        let path = build_path(&SparsityWeight::Single(5.0), x.view(), y.view(), 1e-6, 50);
        assert_eq!(path.len(), 1);
        assert_eq!(
            path.stages[0],
            PathStage {
                tau: 5.0,
                tolerance: 1e-6,
                max_iterations: 50
            }
        );
    }

    #[test]
    fn single_weight_below_tau_max_builds_geometric_path() {
        let x = array![[1.0], [-1.0]];
        let y = array![1.0, -1.0];
        // tau_max = 1
        let path = build_path(&SparsityWeight::Single(1e-3), x.view(), y.view(), 1e-6, 50);
        assert_eq!(path.len(), PATH_LENGTH);
        assert_eq!(path.stages[0].tau, 1.0);
        assert_eq!(path.stages[PATH_LENGTH - 1].tau, 1e-3);

        let ratio = path.stages[1].tau / path.stages[0].tau;
        for pair in path.stages.windows(2) {
            assert!(pair[1].tau < pair[0].tau);
            assert_abs_diff_eq!(pair[1].tau / pair[0].tau, ratio, epsilon = 1e-9);
        }

        for stage in &path.stages[..PATH_LENGTH - 1] {
            assert_abs_diff_eq!(stage.tolerance, 1e-4, epsilon = 1e-18);
        }
        assert_eq!(path.stages[PATH_LENGTH - 1].tolerance, 1e-6);
        assert!(path.stages.iter().all(|s| s.max_iterations == 50));
    }

    #[test]
    fn explicit_sequence_is_kept_in_order() {
        let x = array![[1.0], [-1.0]];
        let y = array![1.0, -1.0];
        let weight = SparsityWeight::Sequence(vec![0.1, 0.5, 0.01]);
        let path = build_path(&weight, x.view(), y.view(), 1e-5, 7);
        let taus: Vec<f64> = path.stages.iter().map(|s| s.tau).collect();
        assert_eq!(taus, vec![0.1, 0.5, 0.01]);
        assert_abs_diff_eq!(path.stages[0].tolerance, 1e-3, epsilon = 1e-15);
        assert_abs_diff_eq!(path.stages[1].tolerance, 1e-3, epsilon = 1e-15);
        assert_eq!(path.stages[2].tolerance, 1e-5);
    }
}
