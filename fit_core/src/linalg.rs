//! Dense linear algebra shared by the fitting engines.
//!
//! Arrays are stored as `ndarray` containers; factorizations (inverse, SVD,
//! least squares) go through `nalgebra`.

use log::warn;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut2, Axis};

use crate::{FitErr, Result};

/// Converts an ndarray matrix view into a nalgebra `DMatrix`.
pub fn to_dmatrix(a: ArrayView2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Converts a nalgebra `DMatrix` back into an ndarray matrix.
pub fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    let (nrows, ncols) = m.shape();
    Array2::from_shape_fn((nrows, ncols), |(i, j)| m[(i, j)])
}

/// Inverts a square matrix.
///
/// # Arguments
/// * `a` - The matrix to invert.
/// * `what` - A name for `a`, used in the error.
///
/// # Returns
/// The inverse or `FitErr::Singular` if `a` can't be inverted.
pub fn inverse(a: ArrayView2<f64>, what: &'static str) -> Result<Array2<f64>> {
    if a.nrows() != a.ncols() {
        return Err(FitErr::SizeMismatch {
            what: "square matrix columns",
            got: a.ncols(),
            expected: a.nrows(),
        });
    }

    to_dmatrix(a)
        .try_inverse()
        .map(|inv| to_array2(&inv))
        .ok_or(FitErr::Singular { what })
}

/// Solves the square system `a x = b` for every column of `b`.
pub fn solve(a: ArrayView2<f64>, b: ArrayView2<f64>, what: &'static str) -> Result<Array2<f64>> {
    let lu = to_dmatrix(a).lu();
    lu.solve(&to_dmatrix(b))
        .map(|x| to_array2(&x))
        .ok_or(FitErr::Singular { what })
}

/// Least-squares solution of `a x = b` through the SVD of `a`.
///
/// Singular values below `rcond * max(singular values)` are treated as zero.
/// Without `rcond` the cutoff defaults to machine epsilon times the largest
/// dimension of `a`.
///
/// # Returns
/// The `(cols(a), cols(b))` solution matrix.
pub fn lstsq(a: ArrayView2<f64>, b: ArrayView2<f64>, rcond: Option<f64>) -> Result<Array2<f64>> {
    if a.nrows() != b.nrows() {
        return Err(FitErr::SizeMismatch {
            what: "least squares right hand side rows",
            got: b.nrows(),
            expected: a.nrows(),
        });
    }

    let rcond = rcond.unwrap_or(f64::EPSILON * a.nrows().max(a.ncols()) as f64);
    let svd = to_dmatrix(a).svd(true, true);
    let cutoff = rcond * svd.singular_values.max();

    svd.solve(&to_dmatrix(b), cutoff)
        .map(|x| to_array2(&x))
        .map_err(FitErr::LeastSquares)
}

/// Thin singular value decomposition `a = U diag(s) Vᵀ`.
///
/// # Returns
/// `(U, s, Vᵀ)` with the singular values in descending order.
pub fn svd(a: ArrayView2<f64>) -> Result<(Array2<f64>, Array1<f64>, Array2<f64>)> {
    let svd = to_dmatrix(a).svd(true, true);
    let u = svd.u.ok_or(FitErr::Svd("left singular vectors are missing"))?;
    let v_t = svd.v_t.ok_or(FitErr::Svd("right singular vectors are missing"))?;

    let mut order: Vec<_> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&i, &j| svd.singular_values[j].total_cmp(&svd.singular_values[i]));

    let u = Array2::from_shape_fn((u.nrows(), order.len()), |(i, j)| u[(i, order[j])]);
    let s = order.iter().map(|&j| svd.singular_values[j]).collect();
    let v_t = Array2::from_shape_fn((order.len(), v_t.ncols()), |(i, j)| v_t[(order[i], j)]);

    Ok((u, s, v_t))
}

/// Returns the singular values of `a`, without forming the singular vectors.
pub fn singular_values(a: ArrayView2<f64>) -> Array1<f64> {
    let values = to_dmatrix(a).singular_values();
    values.iter().copied().collect()
}

/// The euclidean norm of every column of `a`.
pub fn col_norms(a: ArrayView2<f64>) -> Array1<f64> {
    a.axis_iter(Axis(1)).map(|col| col.dot(&col).sqrt()).collect()
}

/// Divides every column of `a` by the matching entry of `norms`.
///
/// Columns with a zero norm are left untouched.
pub fn div_cols(mut a: ArrayViewMut2<f64>, norms: ArrayView1<f64>) {
    for (j, (mut col, &norm)) in a.axis_iter_mut(Axis(1)).zip(norms).enumerate() {
        if norm > 0. {
            col /= norm;
        } else {
            warn!(column = j; "skipping normalization of a zero column");
        }
    }
}

/// Divides every column of `a` by its euclidean norm.
pub fn norm_cols(mut a: Array2<f64>) -> Array2<f64> {
    let norms = col_norms(a.view());
    div_cols(a.view_mut(), norms.view());
    a
}

/// The positive part of `a`, `(|a| + a) / 2`.
pub fn pos(a: &Array2<f64>) -> Array2<f64> {
    a.mapv(|x| (x.abs() + x) / 2.)
}

/// The negative part of `a`, `(|a| - a) / 2`.
pub fn neg(a: &Array2<f64>) -> Array2<f64> {
    a.mapv(|x| (x.abs() - x) / 2.)
}
