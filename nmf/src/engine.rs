use fit_core::{Result, linalg};
use log::{debug, info};
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use crate::NmfFitConfig;

/// Keeps the multiplicative update away from `0 / 0`.
const H_OFFSET: f64 = 1e-16;

/// Recorded costs that have to agree before the fit stops.
const CONVERGENCE_WINDOW: usize = 10;

/// The largest change between recorded costs of a converged fit.
const CONVERGENCE_TOL: f64 = 1e-7;

/// A factor constrained to a basis, `factor = basis · coef`.
#[derive(Debug, Clone)]
pub(crate) struct Constrained {
    pub(crate) basis: Array2<f64>,
    pub(crate) coef: Array2<f64>,
}

/// What happened during a semiNMF fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NmfReport {
    /// The `(iteration, cost)` checkpoints, recorded every `verbal` iterations.
    pub checkpoints: Vec<(usize, f64)>,
    /// The amount of alternating updates that ran.
    pub iterations: usize,
    /// Whether the recorded costs settled before the budget ran out.
    pub converged: bool,
}

impl NmfReport {
    /// The last recorded cost, if any.
    pub fn final_cost(&self) -> Option<f64> {
        self.checkpoints.last().map(|&(_, cost)| cost)
    }

    fn has_converged(&self) -> bool {
        let n = self.checkpoints.len();
        n >= CONVERGENCE_WINDOW
            && self.checkpoints[n - CONVERGENCE_WINDOW..]
                .windows(2)
                .all(|pair| (pair[1].1 - pair[0].1).abs() < CONVERGENCE_TOL)
    }
}

/// A semiNMF factorization `V ≈ W Hᵀ` with a nonnegative `H`.
///
/// Built with [`SemiNmfBuilder`](crate::SemiNmfBuilder).
#[derive(Debug, Clone)]
pub struct SemiNmf {
    v: Array2<f64>,
    w: Array2<f64>,
    h: Array2<f64>,
    left: Option<Constrained>,
    right: Option<Constrained>,
    norm_w: bool,
    norm_h: bool,
    rcond: Option<f64>,
    lambd: f64,
    report: NmfReport,
}

impl SemiNmf {
    /// Assembles an engine from already initialized factors.
    ///
    /// `norm_w` and `norm_h` record whether a left or right basis was
    /// requested, the updates normalize the factor columns on those flags.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        v: Array2<f64>,
        w: Array2<f64>,
        h: Array2<f64>,
        left: Option<Constrained>,
        right: Option<Constrained>,
        norm_w: bool,
        norm_h: bool,
        rcond: Option<f64>,
    ) -> Self {
        Self {
            v,
            w,
            h,
            left,
            right,
            norm_w,
            norm_h,
            rcond,
            lambd: NmfFitConfig::default().lambd,
            report: NmfReport::default(),
        }
    }

    pub fn v(&self) -> ArrayView2<'_, f64> {
        self.v.view()
    }

    pub fn w(&self) -> ArrayView2<'_, f64> {
        self.w.view()
    }

    pub fn h(&self) -> ArrayView2<'_, f64> {
        self.h.view()
    }

    /// The left basis `L`, if `W` is constrained.
    pub fn l(&self) -> Option<ArrayView2<'_, f64>> {
        self.left.as_ref().map(|c| c.basis.view())
    }

    /// The right basis `R`, if `H` is constrained.
    pub fn r(&self) -> Option<ArrayView2<'_, f64>> {
        self.right.as_ref().map(|c| c.basis.view())
    }

    /// The coefficients `B` of `W = L B`.
    pub fn b(&self) -> Option<ArrayView2<'_, f64>> {
        self.left.as_ref().map(|c| c.coef.view())
    }

    /// The nonnegative coefficients `D` of `H = R D`.
    ///
    /// When `H` is column normalized, `H` equals `R D` up to a per column scale.
    pub fn d(&self) -> Option<ArrayView2<'_, f64>> {
        self.right.as_ref().map(|c| c.coef.view())
    }

    pub fn lambd(&self) -> f64 {
        self.lambd
    }

    pub fn report(&self) -> &NmfReport {
        &self.report
    }

    /// The mean squared reconstruction error, `mean((V - W Hᵀ)²)`.
    pub fn compute_cost(&self) -> f64 {
        let residual = &self.v - &self.w.dot(&self.h.t());
        residual.mapv(|x| x * x).mean().unwrap_or_default()
    }

    /// Solves for `W` given `H`, `W = V H (Hᵀ H)⁻¹`, projected onto the left
    /// basis when there is one.
    pub fn update_w(&mut self) -> Result<()> {
        let vh = self.v.dot(&self.h);
        let hth = self.h.t().dot(&self.h);
        let target = vh.dot(&linalg::inverse(hth.view(), "HᵀH")?);

        let mut w = match &mut self.left {
            Some(left) => {
                left.coef = linalg::lstsq(left.basis.view(), target.view(), self.rcond)?;
                left.basis.dot(&left.coef)
            }
            None => target,
        };

        if self.norm_w {
            let norms = linalg::col_norms(w.view());
            linalg::div_cols(w.view_mut(), norms.view());

            if let Some(left) = &mut self.left {
                linalg::div_cols(left.coef.view_mut(), norms.view());
            }
        }

        self.w = w;
        Ok(())
    }

    /// Multiplicative update of `H`, or of `D` when `H = R D`.
    ///
    /// Every entry is scaled by a nonnegative factor, so a nonnegative `H`
    /// (or `D` with a nonnegative `R`) stays nonnegative.
    pub fn update_h(&mut self) -> Result<()> {
        let vtw = self.v.t().dot(&self.w);
        let wtw = self.w.t().dot(&self.w);
        let (vtw_pos, vtw_neg) = (linalg::pos(&vtw), linalg::neg(&vtw));
        let (wtw_pos, wtw_neg) = (linalg::pos(&wtw), linalg::neg(&wtw));

        let h = match &mut self.right {
            Some(right) => {
                let r = &right.basis;
                let rtr_d = r.t().dot(r).dot(&right.coef);

                let upper = r.t().dot(&vtw_pos) + rtr_d.dot(&wtw_neg) + H_OFFSET;
                let lower = r.t().dot(&vtw_neg) + rtr_d.dot(&wtw_pos) + H_OFFSET;
                multiplicative_step(&mut right.coef, &upper, &lower);

                r.dot(&right.coef)
            }
            None => {
                let mut h = std::mem::take(&mut self.h);

                let upper = &vtw_pos + &h.dot(&wtw_neg) + H_OFFSET;
                let lower = &vtw_neg + &h.dot(&wtw_pos) + H_OFFSET;
                multiplicative_step(&mut h, &upper, &lower);

                h
            }
        };

        self.h = if self.norm_h { linalg::norm_cols(h) } else { h };
        Ok(())
    }

    /// Alternates `update_w` and `update_h` for at most `config.num_iters`
    /// iterations.
    ///
    /// Costs are only recorded, and convergence only checked, every
    /// `config.verbal` iterations. A silent fit runs the whole budget.
    pub fn fit(&mut self, config: &NmfFitConfig) -> Result<&NmfReport> {
        let NmfFitConfig {
            num_iters,
            lambd,
            verbal,
            tolerance,
        } = *config;

        self.lambd = lambd;
        let mut report = NmfReport::default();

        if verbal > 0 {
            info!("Iter\tCost");
        }

        for i in 0..num_iters {
            self.update_w()?;
            self.update_h()?;
            report.iterations = i + 1;

            if verbal == 0 || i % verbal != 0 {
                continue;
            }

            let cost = self.compute_cost();
            debug!(iter = i, cost = cost; "semiNMF checkpoint");
            info!("{i}\t{cost:.3}");
            report.checkpoints.push((i, cost));

            if report.has_converged() {
                info!(
                    "Stop: cost has been changing so small in the last {tolerance:03} checkpoints. Final cost = {cost:.3}"
                );
                report.converged = true;
                break;
            }
        }

        if !report.converged
            && let Some(cost) = report.final_cost()
        {
            info!("Stop: reached maximum iterations. Final cost = {cost:.3}");
        }

        self.report = report;
        Ok(&self.report)
    }
}

/// `x ⊙= sqrt(upper / lower)`.
fn multiplicative_step(x: &mut Array2<f64>, upper: &Array2<f64>, lower: &Array2<f64>) {
    Zip::from(x)
        .and(upper)
        .and(lower)
        .for_each(|x, &u, &l| *x *= (u / l).sqrt());
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Axis, array};

    fn low_rank_v() -> Array2<f64> {
        let w = array![[1., -0.5], [0.3, 2.], [-1., 1.], [2., 0.2], [0.5, -1.5]];
        let h = array![[1., 0.2], [0.1, 1.], [0.7, 0.7], [0., 1.3], [1.1, 0.], [0.4, 0.9]];
        w.dot(&h.t())
    }

    fn unconstrained() -> SemiNmf {
        let v = low_rank_v();
        let w = Array2::from_shape_fn((5, 2), |(i, j)| ((i + 2 * j) as f64).sin());
        let h = Array2::from_shape_fn((6, 2), |(i, j)| 0.5 + ((i * 3 + j) as f64).cos().abs());
        SemiNmf::new(v, w, h, None, None, false, false, None)
    }

    fn constrained() -> SemiNmf {
        let v = low_rank_v();
        let l = Array2::from_shape_fn((5, 3), |(i, j)| ((i + 1) as f64).powi(j as i32) / 5.);
        let r = Array2::from_shape_fn((6, 4), |(i, j)| if i.abs_diff(j + 1) <= 1 { 1. } else { 0.1 });
        let b = Array2::from_shape_fn((3, 2), |(i, j)| (i as f64) - (j as f64) + 0.5);
        let d = Array2::from_shape_fn((4, 2), |(i, j)| 0.2 + 0.3 * ((i + j) % 3) as f64);

        let w = l.dot(&b);
        let h = r.dot(&d);
        SemiNmf::new(
            v,
            w,
            h,
            Some(Constrained { basis: l, coef: b }),
            Some(Constrained { basis: r, coef: d }),
            true,
            true,
            None,
        )
    }

    #[test]
    fn cost_never_increases_without_bases() {
        let mut nmf = unconstrained();
        let mut last = nmf.compute_cost();

        for _ in 0..100 {
            nmf.update_w().unwrap();
            nmf.update_h().unwrap();

            let cost = nmf.compute_cost();
            assert!(cost <= last + 1e-12, "cost went from {last} to {cost}");
            last = cost;
        }
    }

    #[test]
    fn d_stays_nonnegative() {
        let mut nmf = constrained();

        for _ in 0..50 {
            nmf.update_w().unwrap();
            nmf.update_h().unwrap();
            assert!(nmf.d().unwrap().iter().all(|&x| x >= 0.));
            assert!(nmf.h().iter().all(|&x| x >= 0.));
        }
    }

    #[test]
    fn w_follows_left_basis() {
        let mut nmf = constrained();
        nmf.update_w().unwrap();

        let (l, b) = (nmf.l().unwrap(), nmf.b().unwrap());
        assert_abs_diff_eq!(nmf.w(), l.dot(&b).view(), epsilon = 1e-10);
    }

    #[test]
    fn w_columns_are_normalized_iff_left_basis_was_requested() {
        let mut nmf = constrained();
        nmf.update_w().unwrap();
        for col in nmf.w().axis_iter(Axis(1)) {
            assert_abs_diff_eq!(col.dot(&col), 1., epsilon = 1e-10);
        }

        let mut nmf = unconstrained();
        nmf.update_w().unwrap();
        let norms = linalg::col_norms(nmf.w());
        assert!(norms.iter().any(|&n| (n - 1.).abs() > 1e-3));
    }

    #[test]
    fn h_columns_are_normalized_iff_right_basis_was_requested() {
        let mut nmf = constrained();
        nmf.update_w().unwrap();
        nmf.update_h().unwrap();
        for col in nmf.h().axis_iter(Axis(1)) {
            assert_abs_diff_eq!(col.dot(&col), 1., epsilon = 1e-10);
        }

        let mut nmf = unconstrained();
        nmf.update_w().unwrap();
        nmf.update_h().unwrap();
        let norms = linalg::col_norms(nmf.h());
        assert!(norms.iter().any(|&n| (n - 1.).abs() > 1e-3));
    }

    fn unit_columns(a: ArrayView2<f64>) -> bool {
        linalg::col_norms(a).iter().all(|&n| (n - 1.).abs() < 1e-10)
    }

    #[test]
    fn normalization_follows_the_flags_not_the_bases() {
        let base = unconstrained();

        let mut nmf = SemiNmf::new(
            base.v.clone(),
            base.w.clone(),
            base.h.clone(),
            None,
            None,
            true,
            false,
            None,
        );
        nmf.update_w().unwrap();
        nmf.update_h().unwrap();
        assert!(nmf.l().is_none());
        assert!(unit_columns(nmf.w()));
        assert!(!unit_columns(nmf.h()));

        let mut nmf = SemiNmf::new(base.v, base.w, base.h, None, None, false, true, None);
        nmf.update_w().unwrap();
        nmf.update_h().unwrap();
        assert!(nmf.r().is_none());
        assert!(!unit_columns(nmf.w()));
        assert!(unit_columns(nmf.h()));
    }

    #[test]
    fn bases_without_flags_skip_normalization() {
        let mut nmf = constrained();
        nmf.norm_w = false;
        nmf.norm_h = false;

        nmf.update_w().unwrap();
        nmf.update_h().unwrap();

        assert!(nmf.l().is_some());
        assert!(nmf.r().is_some());
        assert!(!unit_columns(nmf.w()));
        assert!(!unit_columns(nmf.h()));

        let (l, b) = (nmf.l().unwrap(), nmf.b().unwrap());
        assert_abs_diff_eq!(nmf.w(), l.dot(&b).view(), epsilon = 1e-10);
        let (r, d) = (nmf.r().unwrap(), nmf.d().unwrap());
        assert_abs_diff_eq!(nmf.h(), r.dot(&d).view(), epsilon = 1e-10);
    }

    #[test]
    fn silent_fit_runs_the_whole_budget() {
        let mut nmf = unconstrained();
        let config = NmfFitConfig {
            num_iters: 40,
            verbal: 0,
            ..Default::default()
        };

        let report = nmf.fit(&config).unwrap();
        assert_eq!(report.iterations, 40);
        assert!(report.checkpoints.is_empty());
        assert!(!report.converged);
    }

    #[test]
    fn verbal_fit_records_checkpoints_and_stops_early() {
        let mut nmf = unconstrained();
        let config = NmfFitConfig {
            num_iters: 20_000,
            verbal: 1,
            lambd: 0.5,
            ..Default::default()
        };

        let report = nmf.fit(&config).unwrap().clone();
        assert!(report.converged);
        assert!(report.iterations < 20_000);
        assert_eq!(report.checkpoints.len(), report.iterations);
        assert_eq!(report.checkpoints[0].0, 0);
        assert_eq!(nmf.lambd(), 0.5);
    }

    #[test]
    fn checkpoints_are_spaced_by_verbal() {
        let mut nmf = unconstrained();
        let config = NmfFitConfig {
            num_iters: 12,
            verbal: 5,
            ..Default::default()
        };

        let report = nmf.fit(&config).unwrap();
        let iters: Vec<_> = report.checkpoints.iter().map(|&(i, _)| i).collect();
        assert_eq!(iters, vec![0, 5, 10]);
    }

    #[test]
    fn convergence_needs_a_full_window() {
        let mut report = NmfReport::default();
        for i in 0..CONVERGENCE_WINDOW - 1 {
            report.checkpoints.push((i, 1.));
        }
        assert!(!report.has_converged());

        report.checkpoints.push((CONVERGENCE_WINDOW, 1. + 1e-8));
        assert!(report.has_converged());

        report.checkpoints.push((CONVERGENCE_WINDOW + 1, 1.1));
        assert!(!report.has_converged());
    }
}
