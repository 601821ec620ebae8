use ndarray::{Array1, ArrayView1};

/// Proximal operator of `threshold * ||.||_1`, applied in place.
///
/// Entries with magnitude at or below the threshold become exactly zero; the
/// rest move toward zero by `threshold` and keep their sign.
pub fn soft_threshold(v: &mut Array1<f64>, threshold: f64) {
    v.mapv_inplace(|value| {
        let magnitude = value.abs() - threshold;
        if magnitude > 0.0 {
            magnitude.copysign(value)
        } else {
            0.0
        }
    });
}

/// One proximal-gradient step: a gradient step of length `step` on the smooth
/// part followed by soft-thresholding at `tau * step`.
pub fn proximal_step(
    point: ArrayView1<f64>,
    gradient: ArrayView1<f64>,
    step: f64,
    tau: f64,
) -> Array1<f64> {
    let mut next = &point - &(&gradient * step);
    soft_threshold(&mut next, tau * step);
    next
}
