//! Dense helpers for the small symmetric systems the regressors solve.
//!
//! LARS grows its active-set factor one column at a time, so it keeps a
//! plain Cholesky. Ridge and Bayesian ridge use the LAPACK eigensolver.

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ndarray_linalg::{Eigh, UPLO};

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
///
/// Returns `None` when a pivot is not strictly positive.
pub fn cholesky(a: ArrayView2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if !(diag > 1e-12 * a[[j, j]].abs().max(f64::MIN_POSITIVE)) {
            return None;
        }
        let d = diag.sqrt();
        l[[j, j]] = d;

        for i in (j + 1)..n {
            let mut v = a[[i, j]];
            for k in 0..j {
                v -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = v / d;
        }
    }

    Some(l)
}

/// Solve `L Lᵀ x = b` given the Cholesky factor `L`
pub fn cholesky_solve(l: ArrayView2<f64>, b: ArrayView1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut v = b[i];
        for k in 0..i {
            v -= l[[i, k]] * z[k];
        }
        z[i] = v / l[[i, i]];
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut v = z[i];
        for k in (i + 1)..n {
            v -= l[[k, i]] * x[k];
        }
        x[i] = v / l[[i, i]];
    }
    x
}

/// Eigen-decomposition `XᵀX = V diag(w) Vᵀ` of the Gram matrix of `x`.
///
/// Returns `(w, V)` with eigenvectors in the columns of `V` and eigenvalues
/// clamped at zero.
pub fn gram_eigh(x: ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    let gram = x.t().dot(&x);
    let (eigvals, eigvecs): (Array1<f64>, Array2<f64>) = gram
        .eigh(UPLO::Lower)
        .map_err(|e| Error::fitting(format!("eigendecomposition of the Gram matrix failed: {}", e)))?;
    Ok((eigvals.mapv(|e| e.max(0.0)), eigvecs))
}
