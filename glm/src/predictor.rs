use fit_core::{BasisProvider, BasisSpec, FitErr, Result, linalg};
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, concatenate, s};

/// Everything about a `LinearPredictor` that isn't the design, the response or
/// the basis.
#[derive(Debug, Clone)]
pub struct PredictorOptions {
    /// The time bin size.
    pub dt: f64,
    /// A per-sample scale of the conditional intensity, all ones if missing.
    pub scale: Option<Array1<f64>>,
    /// Whether to compute the unpenalized least-squares filter `w_mle`.
    pub compute_mle: bool,
    /// Prepends a constant column to `X` with its own basis coefficient.
    pub add_intercept: bool,
}

impl Default for PredictorOptions {
    fn default() -> Self {
        Self {
            dt: 1.,
            scale: None,
            compute_mle: false,
            add_intercept: false,
        }
    }
}

impl PredictorOptions {
    /// The defaults of a `SplineLnln`, which also computes `w_mle`.
    pub fn lnln() -> Self {
        Self::default().compute_mle(true)
    }

    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn scale(mut self, scale: Array1<f64>) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn compute_mle(mut self, compute_mle: bool) -> Self {
        self.compute_mle = compute_mle;
        self
    }

    pub fn add_intercept(mut self, add_intercept: bool) -> Self {
        self.add_intercept = add_intercept;
        self
    }
}

/// The linear stage shared by every spline GLM: the design `X`, the response
/// `y`, the basis `S` and the basis-reduced design `XS = X S`.
///
/// All of it is fixed at construction.
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    x: Array2<f64>,
    y: Array1<f64>,
    s: Array2<f64>,
    xs: Array2<f64>,
    dt: f64,
    scale: Array1<f64>,
    w_mle: Option<Array1<f64>>,
    b_spl: Option<Array1<f64>>,
    w_spl: Option<Array1<f64>>,
}

impl LinearPredictor {
    /// Creates a new `LinearPredictor` from an already built basis.
    ///
    /// # Arguments
    /// * `x` - The `(samples, features)` design matrix.
    /// * `y` - The response, one value per sample.
    /// * `s` - The `(features, coefficients)` basis.
    /// * `options` - Bin size, intensity scale, intercept and whether to compute
    ///   `w_mle`.
    ///
    /// With an intercept, `X` gains a leading column of ones and `S` becomes
    /// `diag(1, S)`, so the intercept is the first coefficient and the first
    /// entry of every filter.
    ///
    /// # Returns
    /// A new `LinearPredictor` or an error if the shapes don't line up.
    pub fn new(
        x: Array2<f64>,
        y: Array1<f64>,
        s: Array2<f64>,
        options: PredictorOptions,
    ) -> Result<Self> {
        let (n_samples, n_features) = x.dim();

        if y.len() != n_samples {
            return Err(FitErr::SizeMismatch {
                what: "response",
                got: y.len(),
                expected: n_samples,
            });
        }

        if s.nrows() != n_features {
            return Err(FitErr::SizeMismatch {
                what: "basis rows",
                got: s.nrows(),
                expected: n_features,
            });
        }

        let PredictorOptions {
            dt,
            scale,
            compute_mle,
            add_intercept,
        } = options;

        let (x, s) = if add_intercept {
            with_intercept(x, s)
        } else {
            (x, s)
        };

        let scale = scale.unwrap_or_else(|| Array1::ones(n_samples));
        if scale.len() != n_samples {
            return Err(FitErr::SizeMismatch {
                what: "intensity scale",
                got: scale.len(),
                expected: n_samples,
            });
        }

        let xs = x.dot(&s);

        let w_mle = if compute_mle {
            let xtx = x.t().dot(&x);
            let xty = x.t().dot(&y);
            Some(solve_vec(xtx.view(), xty.view(), "XtX")?)
        } else {
            None
        };

        let xsty = xs.t().dot(&y);
        let b_spl = match solve_vec(xs.t().dot(&xs).view(), xsty.view(), "XStXS") {
            Ok(b) => Some(b),
            Err(e) => {
                warn!("no spline least-squares estimate: {e}");
                None
            }
        };
        let w_spl = b_spl.as_ref().map(|b| s.dot(b));

        debug!(
            samples = n_samples,
            features = x.ncols(),
            coefficients = s.ncols(),
            intercept = add_intercept;
            "built linear predictor"
        );

        Ok(Self {
            x,
            y,
            s,
            xs,
            dt,
            scale,
            w_mle,
            b_spl,
            w_spl,
        })
    }

    /// Creates a new `LinearPredictor`, asking `provider` for the basis.
    ///
    /// # Arguments
    /// * `x` - The `(samples, features)` design matrix.
    /// * `y` - The response, one value per sample.
    /// * `spec` - The shape, degrees of freedom and kind of the basis.
    /// * `provider` - Builds the basis matrix.
    /// * `options` - Bin size, intensity scale and whether to compute `w_mle`.
    pub fn from_provider<P: BasisProvider + ?Sized>(
        x: Array2<f64>,
        y: Array1<f64>,
        spec: &BasisSpec,
        provider: &P,
        options: PredictorOptions,
    ) -> Result<Self> {
        let s = provider.build(spec)?;
        Self::new(x, y, s, options)
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    pub fn s(&self) -> ArrayView2<'_, f64> {
        self.s.view()
    }

    /// The basis-reduced design, `X S`.
    pub fn xs(&self) -> ArrayView2<'_, f64> {
        self.xs.view()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn scale(&self) -> ArrayView1<'_, f64> {
        self.scale.view()
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// The amount of basis coefficients per subunit.
    pub fn n_b(&self) -> usize {
        self.s.ncols()
    }

    /// The least-squares filter `(X^T X)^-1 X^T y`, if it was requested.
    pub fn w_mle(&self) -> Option<ArrayView1<'_, f64>> {
        self.w_mle.as_ref().map(|w| w.view())
    }

    /// The least-squares basis coefficients `(XS^T XS)^-1 XS^T y`, missing when
    /// `XS^T XS` is singular.
    pub fn b_spl(&self) -> Option<ArrayView1<'_, f64>> {
        self.b_spl.as_ref().map(|b| b.view())
    }

    /// The filter spanned by `b_spl`, `S b_spl`.
    pub fn w_spl(&self) -> Option<ArrayView1<'_, f64>> {
        self.w_spl.as_ref().map(|w| w.view())
    }
}

fn with_intercept(x: Array2<f64>, s: Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let ones = Array2::ones((x.nrows(), 1));
    let x = concatenate![Axis(1), ones, x];

    let mut basis = Array2::zeros((s.nrows() + 1, s.ncols() + 1));
    basis[[0, 0]] = 1.;
    basis.slice_mut(s![1.., 1..]).assign(&s);

    (x, basis)
}

fn solve_vec(a: ArrayView2<f64>, b: ArrayView1<f64>, what: &'static str) -> Result<Array1<f64>> {
    let x = linalg::solve(a, b.insert_axis(Axis(1)), what)?;
    Ok(x.column(0).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use fit_core::{Smooth, basis::PrecomputedBasis};
    use ndarray::array;

    fn design() -> (Array2<f64>, Array1<f64>) {
        let x = array![[1., 0., 2.], [0., 1., 1.], [1., 1., 0.], [2., 0., 1.], [0., 3., 1.]];
        let y = array![1., 0., 2., 1., 3.];
        (x, y)
    }

    #[test]
    fn xs_is_x_times_s() {
        let (x, y) = design();
        let s = array![[1., 0.], [0.5, 1.], [0., -1.]];

        let predictor = LinearPredictor::new(x.clone(), y, s.clone(), Default::default()).unwrap();

        assert_abs_diff_eq!(predictor.xs().to_owned(), x.dot(&s), epsilon = 1e-15);
        assert_eq!(predictor.n_b(), 2);
        assert_eq!(predictor.scale(), Array1::<f64>::ones(5));
    }

    #[test]
    fn basis_rows_must_match_features() {
        let (x, y) = design();
        let s = Array2::eye(2);

        assert!(matches!(
            LinearPredictor::new(x, y, s, Default::default()),
            Err(FitErr::SizeMismatch {
                what: "basis rows",
                got: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn response_must_match_samples() {
        let (x, _) = design();

        assert!(LinearPredictor::new(x, array![1., 2.], Array2::eye(3), Default::default()).is_err());
    }

    #[test]
    fn scale_must_match_samples() {
        let (x, y) = design();
        let options = PredictorOptions::default().scale(array![1., 2.]);

        assert!(LinearPredictor::new(x, y, Array2::eye(3), options).is_err());
    }

    #[test]
    fn least_squares_estimates() {
        let (x, y) = design();
        let options = PredictorOptions::default().compute_mle(true);

        let predictor = LinearPredictor::from_provider(
            x.clone(),
            y.clone(),
            &BasisSpec::new(vec![3], vec![3], Smooth::Cr),
            &PrecomputedBasis::new(Array2::eye(3)),
            options,
        )
        .unwrap();

        // With the identity basis both estimates are the ordinary least squares one.
        let w_mle = predictor.w_mle().unwrap().to_owned();
        assert_abs_diff_eq!(w_mle, predictor.w_spl().unwrap().to_owned(), epsilon = 1e-10);

        // Normal equations hold.
        let residual = &y - &x.dot(&w_mle);
        assert_abs_diff_eq!(x.t().dot(&residual), Array1::zeros(3), epsilon = 1e-10);
    }

    #[test]
    fn singular_spline_system_has_no_estimate() {
        let (x, y) = design();
        let s = array![[1., 1.], [1., 1.], [1., 1.]];

        let predictor = LinearPredictor::new(x, y, s, Default::default()).unwrap();
        assert!(predictor.b_spl().is_none());
        assert!(predictor.w_spl().is_none());
    }

    #[test]
    fn intercept_gets_its_own_coefficient() {
        let (x, y) = design();
        let s = array![[1., 0.], [0.5, 1.], [0., -1.]];
        let options = PredictorOptions::default().add_intercept(true);

        let predictor = LinearPredictor::new(x.clone(), y, s, options).unwrap();

        assert_eq!(predictor.n_features(), 4);
        assert_eq!(predictor.n_b(), 3);
        assert_eq!(predictor.x().column(0), Array1::<f64>::ones(5));
        assert_eq!(predictor.s().row(0), array![1., 0., 0.]);
        assert_eq!(predictor.s().column(0), array![1., 0., 0., 0.]);
        assert_abs_diff_eq!(
            predictor.xs().to_owned(),
            predictor.x().dot(&predictor.s()),
            epsilon = 1e-15
        );
    }

    #[test]
    fn lnln_defaults_compute_mle() {
        let (x, y) = design();

        let lnln = LinearPredictor::new(x.clone(), y.clone(), Array2::eye(3), PredictorOptions::lnln())
            .unwrap();
        let plain = LinearPredictor::new(x, y, Array2::eye(3), Default::default()).unwrap();

        assert!(lnln.w_mle().is_some());
        assert!(plain.w_mle().is_none());
    }
}
