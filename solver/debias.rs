use crate::fit::FitError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_linalg::{LeastSquaresSvd, SolveC};

/// Least-squares fit of `y` on the columns of `x`.
///
/// Without a weight (or with a zero weight) this is the minimum-norm ordinary
/// least-squares solution from LAPACK `gelsd`, which stays well defined when
/// `x` has more columns than rows. A positive weight `lambda` solves the ridge
/// normal equations `(X'X + lambda I) b = X'y` by Cholesky.
pub fn solve_least_squares(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    weight: Option<f64>,
) -> Result<Array1<f64>, FitError> {
    match weight {
        Some(lambda) if lambda > 0.0 => {
            let mut gram = x.t().dot(&x);
            gram.diag_mut().mapv_inplace(|v| v + lambda);
            let rhs = x.t().dot(&y);
            gram.solvec(&rhs).map_err(FitError::LinearSystemSolveFailed)
        }
        _ => {
            let result = x
                .least_squares(&y)
                .map_err(FitError::LinearSystemSolveFailed)?;
            Ok(result.solution)
        }
    }
}

/// Indices of the non-zero entries of `beta`.
pub fn support(beta: ArrayView1<f64>) -> Vec<usize> {
    beta.iter()
        .enumerate()
        .filter(|(_, b)| **b != 0.0)
        .map(|(idx, _)| idx)
        .collect()
}

/// Refits `y` on the columns selected by `beta`.
///
/// Entries outside the support of `beta` are exactly zero in the result; an
/// empty support gives the zero vector without solving anything.
pub fn debias_on_support(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    beta: ArrayView1<f64>,
    weight: Option<f64>,
) -> Result<Array1<f64>, FitError> {
    let selected = support(beta);
    let mut refit = Array1::zeros(beta.len());
    if selected.is_empty() {
        return Ok(refit);
    }

    let x_selected: Array2<f64> = x.select(Axis(1), &selected);
    let coefficients = solve_least_squares(x_selected.view(), y, weight)?;
    for (&col, &value) in selected.iter().zip(coefficients.iter()) {
        refit[col] = value;
    }
    log::debug!("De-biased {} selected coefficients", selected.len());
    Ok(refit)
}
