use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Design and response with their means removed, plus the means needed to
/// recover the intercept after the zero-intercept problem has been solved.
#[derive(Debug, Clone)]
pub struct CenteredData {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub x_means: Array1<f64>,
    pub y_mean: f64,
}

impl CenteredData {
    /// The intercept matching `beta` on the original scale: `y_mean - x_means . beta`.
    pub fn intercept(&self, beta: ArrayView1<f64>) -> f64 {
        self.y_mean - self.x_means.dot(&beta)
    }
}

/// Removes column means from `x` and the mean from `y` when `fit_offset` is set.
///
/// With the offset disabled the data is returned unchanged and every mean is
/// zero, so the intercept computed later is exactly zero.
pub fn center(x: ArrayView2<f64>, y: ArrayView1<f64>, fit_offset: bool) -> CenteredData {
    if !fit_offset {
        return CenteredData {
            x: x.to_owned(),
            y: y.to_owned(),
            x_means: Array1::zeros(x.ncols()),
            y_mean: 0.0,
        };
    }

    // Callers validate n >= 1, so the means exist.
    let x_means = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let y_mean = y.mean().unwrap_or(0.0);

    let x_centered = &x - &x_means.view().insert_axis(Axis(0));
    let y_centered = y.mapv(|v| v - y_mean);

    CenteredData {
        x: x_centered,
        y: y_centered,
        x_means,
        y_mean,
    }
}
