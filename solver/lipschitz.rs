use crate::fit::FitError;
use ndarray::ArrayView2;
use ndarray_linalg::SVD;

/// Lipschitz constant of the gradient of `(1/2n) * ||y - X b||^2`.
///
/// This is `sigma_max(X)^2 / n`. The largest singular value comes from the
/// LAPACK SVD with singular vectors skipped, so it is exact up to rounding and
/// the resulting step size `1 / L0` never overshoots.
pub fn datafit_lipschitz(x: ArrayView2<f64>) -> Result<f64, FitError> {
    let n = x.nrows() as f64;
    let (_, singular_values, _) = x
        .svd(false, false)
        .map_err(FitError::SpectralNormFailed)?;
    let sigma_max = singular_values.iter().fold(0.0_f64, |acc, &s| acc.max(s));
    log::debug!("Largest singular value of the design: {sigma_max:.6e}");
    Ok(sigma_max * sigma_max / n)
}
