use crate::model::ScalerKind;
use crate::utils::stats;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Column-wise affine transform `(x - offset) / scale`
#[derive(Debug, Clone, PartialEq)]
pub struct FittedScaler {
    pub kind: ScalerKind,
    offset: Array1<f64>,
    scale: Array1<f64>,
}

impl FittedScaler {
    /// Learn the per-column offset and scale from training data.
    ///
    /// Constant columns get a scale of 1 so they map to a constant instead of NaN.
    pub fn fit(kind: ScalerKind, x: ArrayView2<f64>) -> Self {
        let n_cols = x.ncols();
        let (offset, scale) = match kind {
            ScalerKind::None => (Array1::zeros(n_cols), Array1::ones(n_cols)),
            ScalerKind::MinMax => column_params(x, |col| {
                let min = col.iter().copied().fold(f64::INFINITY, f64::min);
                let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }),
            ScalerKind::Standard => column_params(x, |col| {
                (stats::mean(col), stats::variance(col).sqrt())
            }),
            ScalerKind::Robust => column_params(x, |col| {
                let mut sorted = col.to_vec();
                sorted.sort_by(f64::total_cmp);
                let q25 = stats::quantile_sorted(&sorted, 0.25);
                let q75 = stats::quantile_sorted(&sorted, 0.75);
                (stats::quantile_sorted(&sorted, 0.5), q75 - q25)
            }),
        };

        Self {
            kind,
            offset,
            scale: scale.mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s }),
        }
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        if self.kind == ScalerKind::None {
            return x.to_owned();
        }
        (&x - &self.offset) / &self.scale
    }
}

fn column_params<F>(x: ArrayView2<f64>, f: F) -> (Array1<f64>, Array1<f64>)
where
    F: Fn(&[f64]) -> (f64, f64),
{
    let (offset, scale): (Vec<f64>, Vec<f64>) = x
        .axis_iter(Axis(1))
        .map(|col| f(&col.to_vec()))
        .unzip();
    (Array1::from(offset), Array1::from(scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_min_max() {
        let x = array![[1.0, 5.0], [3.0, 5.0], [5.0, 5.0]];
        let scaler = FittedScaler::fit(ScalerKind::MinMax, x.view());
        let out = scaler.transform(x.view());
        assert_eq!(out.column(0).to_vec(), vec![0.0, 0.5, 1.0]);
        // constant column: shifted to zero, not divided by zero
        assert_eq!(out.column(1).to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_standard() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let out = FittedScaler::fit(ScalerKind::Standard, x.view()).transform(x.view());
        let mean: f64 = out.iter().sum::<f64>() / 4.0;
        let var: f64 = out.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_robust() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [100.0]];
        let out = FittedScaler::fit(ScalerKind::Robust, x.view()).transform(x.view());
        // median 3, IQR 4 - 2 = 2
        assert_eq!(out.column(0).to_vec(), vec![-1.0, -0.5, 0.0, 0.5, 48.5]);
    }

    #[test]
    fn test_transform_uses_training_statistics() {
        let train = array![[0.0], [10.0]];
        let test = array![[5.0], [20.0]];
        let scaler = FittedScaler::fit(ScalerKind::MinMax, train.view());
        assert_eq!(scaler.transform(test.view()), array![[0.5], [2.0]]);
    }
}
