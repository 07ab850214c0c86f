use crate::models::config::ArimaOrder;

/// Autoregressive integrated moving-average model estimated by conditional
/// least squares.
///
/// The series is differenced `d` times, AR terms are estimated by ordinary
/// least squares over lagged values, and MA terms (when `q > 0`) by the
/// Hannan-Rissanen two-stage regression on long-autoregression residuals.
/// Stationarity and invertibility are not enforced; a fit on a drifting or
/// explosive series succeeds and simply extrapolates it.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    /// Last `p` differenced values, most recent first.
    diffed_recent: Vec<f64>,
    /// Last `q` in-sample residuals, most recent first.
    resid_recent: Vec<f64>,
    /// Last observed value at each differencing level 0..d, for
    /// re-integrating forecasts back to the original scale.
    level_tail: Vec<f64>,
}

impl ArimaModel {
    pub fn fit(values: &[f64], order: &ArimaOrder) -> Result<ArimaModel, String> {
        let ArimaOrder { p, d, q } = *order;

        if values.iter().any(|v| !v.is_finite()) {
            return Err("series contains a non-finite value".to_string());
        }
        if values.len() <= d {
            return Err(format!(
                "series of {} observations cannot be differenced {d} times",
                values.len()
            ));
        }

        let mut level_tail = Vec::with_capacity(d);
        let mut w: Vec<f64> = values.to_vec();
        for _ in 0..d {
            level_tail.push(w.last().copied().unwrap_or(0.0));
            w = difference(&w);
        }

        let (intercept, ar, ma) = if q == 0 {
            let coefs = fit_ar(&w, p)
                .ok_or_else(|| "singular normal equations in the AR stage".to_string())?;
            (coefs[0], coefs[1..].to_vec(), Vec::new())
        } else {
            // Hannan-Rissanen: residuals of a longer autoregression stand in
            // for the unobserved innovations in the MA regressors.
            let long = (p + q).max(2);
            let long_coefs = fit_ar(&w, long)
                .ok_or_else(|| "singular normal equations in the long AR stage".to_string())?;
            let innovations = ar_residuals(&w, long, &long_coefs);

            let start = p.max(long + q);
            if w.len() < start + p + q + 1 {
                return Err("differenced series too short for the moving-average stage".to_string());
            }
            let mut design = Vec::with_capacity(w.len() - start);
            let mut targets = Vec::with_capacity(w.len() - start);
            for t in start..w.len() {
                let mut row = Vec::with_capacity(1 + p + q);
                row.push(1.0);
                for i in 1..=p {
                    row.push(w[t - i]);
                }
                for j in 1..=q {
                    row.push(innovations[t - j]);
                }
                design.push(row);
                targets.push(w[t]);
            }
            let coefs = ols(&design, &targets)
                .ok_or_else(|| "singular normal equations in the MA stage".to_string())?;
            (coefs[0], coefs[1..=p].to_vec(), coefs[p + 1..].to_vec())
        };

        let residuals = model_residuals(&w, intercept, &ar, &ma);
        let diffed_recent: Vec<f64> = w.iter().rev().take(p).copied().collect();
        let resid_recent: Vec<f64> = residuals.iter().rev().take(q).copied().collect();

        Ok(ArimaModel {
            intercept,
            ar,
            ma,
            diffed_recent,
            resid_recent,
            level_tail,
        })
    }

    /// Produce `steps` sequential forecasts on the original scale. Future
    /// innovations are taken as zero.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        let mut w_recent = self.diffed_recent.clone();
        let mut e_recent = self.resid_recent.clone();
        let mut level = self.level_tail.clone();
        let mut out = Vec::with_capacity(steps);

        for _ in 0..steps {
            let mut z = self.intercept;
            for (i, phi) in self.ar.iter().enumerate() {
                z += phi * w_recent.get(i).copied().unwrap_or(0.0);
            }
            for (j, theta) in self.ma.iter().enumerate() {
                z += theta * e_recent.get(j).copied().unwrap_or(0.0);
            }

            if !self.ar.is_empty() {
                w_recent.insert(0, z);
                w_recent.truncate(self.ar.len());
            }
            if !self.ma.is_empty() {
                e_recent.insert(0, 0.0);
                e_recent.truncate(self.ma.len());
            }

            // Undo the differencing, innermost level out.
            let mut value = z;
            for last in level.iter_mut().rev() {
                value += *last;
                *last = value;
            }
            out.push(value);
        }
        out
    }
}

fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Fit an AR(p) with intercept by least squares. Returns
/// [intercept, phi_1, ..., phi_p], or None when the data cannot support the
/// regression.
fn fit_ar(w: &[f64], p: usize) -> Option<Vec<f64>> {
    if p == 0 {
        if w.is_empty() {
            return None;
        }
        return Some(vec![w.iter().sum::<f64>() / w.len() as f64]);
    }
    if w.len() < 2 * p + 1 {
        return None;
    }

    let mut design = Vec::with_capacity(w.len() - p);
    let mut targets = Vec::with_capacity(w.len() - p);
    for t in p..w.len() {
        let mut row = Vec::with_capacity(1 + p);
        row.push(1.0);
        for i in 1..=p {
            row.push(w[t - i]);
        }
        design.push(row);
        targets.push(w[t]);
    }
    ols(&design, &targets)
}

/// One-step-ahead residuals of an AR(p) fit, zero where lags are undefined.
fn ar_residuals(w: &[f64], p: usize, coefs: &[f64]) -> Vec<f64> {
    let mut resid = vec![0.0; w.len()];
    for t in p..w.len() {
        let mut pred = coefs[0];
        for i in 1..=p {
            pred += coefs[i] * w[t - i];
        }
        resid[t] = w[t] - pred;
    }
    resid
}

/// In-sample residuals of the full ARMA fit, computed recursively with zero
/// residuals before the burn-in index.
fn model_residuals(w: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let burn_in = ar.len().max(ma.len());
    let mut resid = vec![0.0; w.len()];
    for t in burn_in..w.len() {
        let mut pred = intercept;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * w[t - 1 - i];
        }
        for (j, theta) in ma.iter().enumerate() {
            pred += theta * resid[t - 1 - j];
        }
        resid[t] = w[t] - pred;
    }
    resid
}

/// Ordinary least squares via the normal equations. Falls back to a
/// ridge-damped solve when the plain system is singular (collinear lags,
/// constant series).
fn ols(design: &[Vec<f64>], targets: &[f64]) -> Option<Vec<f64>> {
    let k = design.first()?.len();
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in design.iter().zip(targets) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    if let Some(solution) = solve(xtx.clone(), xty.clone()) {
        return Some(solution);
    }
    let trace: f64 = (0..k).map(|i| xtx[i][i]).sum();
    let damp = (trace / k as f64).max(1.0) * 1e-6;
    let mut damped = xtx;
    for (i, row) in damped.iter_mut().enumerate() {
        row[i] += damp;
    }
    solve(damped, xty)
}

/// Gaussian elimination with partial pivoting. None on a (near-)singular
/// system.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return None;
    }
    let threshold = scale * 1e-9;

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < threshold {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for idx in col..n {
                a[row][idx] -= factor * a[col][idx];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for idx in row + 1..n {
            acc -= a[row][idx] * x[idx];
        }
        x[row] = acc / a[row][row];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_order() -> ArimaOrder {
        ArimaOrder { p: 5, d: 1, q: 0 }
    }

    /// Follower-like series: upward drift with uneven daily steps repeating
    /// every five days, so an AR(5) on the differences can represent it
    /// exactly.
    fn drifting_series(len: usize) -> Vec<f64> {
        let steps = [12.0, -3.0, 7.0, 19.0, 2.0];
        let mut value = 1000.0;
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(value);
            value += steps[i % steps.len()];
        }
        out
    }

    #[test]
    fn forecast_returns_requested_horizon() {
        let series = drifting_series(30);
        let model = ArimaModel::fit(&series, &default_order()).expect("fit");
        let forecast = model.forecast(7);
        assert_eq!(forecast.len(), 7);
        assert!(forecast.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn forecast_continues_an_upward_drift() {
        let series = drifting_series(40);
        let last = *series.last().expect("non-empty");
        let model = ArimaModel::fit(&series, &default_order()).expect("fit");
        let forecast = model.forecast(7);
        // The step cycle continues [2, 12, -3, 7, 19, 2, 12] past the end of
        // the series.
        assert!(forecast[6] > last);
        assert!((forecast[0] - (last + 2.0)).abs() < 2.0);
        assert!((forecast[6] - (last + 51.0)).abs() < 5.0);
    }

    #[test]
    fn perfectly_linear_series_survives_collinear_lags() {
        let series: Vec<f64> = (0..30).map(|i| (i * 10) as f64).collect();
        let model = ArimaModel::fit(&series, &default_order()).expect("fit");
        let forecast = model.forecast(3);
        assert!((forecast[0] - 300.0).abs() < 1.0);
        assert!((forecast[2] - 320.0).abs() < 2.0);
    }

    #[test]
    fn extreme_outlier_does_not_break_the_fit() {
        let mut series = drifting_series(30);
        series[15] = 5.0;
        let model = ArimaModel::fit(&series, &default_order()).expect("fit");
        let forecast = model.forecast(7);
        assert_eq!(forecast.len(), 7);
        assert!(forecast.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn too_short_series_is_an_error() {
        let series = drifting_series(9);
        assert!(ArimaModel::fit(&series, &default_order()).is_err());
    }

    #[test]
    fn random_walk_order_forecasts_mean_drift() {
        // (0,1,0): each step is the mean difference.
        let series = vec![100.0, 103.0, 105.0, 110.0, 112.0, 118.0];
        let order = ArimaOrder { p: 0, d: 1, q: 0 };
        let model = ArimaModel::fit(&series, &order).expect("fit");
        let forecast = model.forecast(2);
        let mean_step = (118.0 - 100.0) / 5.0;
        assert!((forecast[0] - (118.0 + mean_step)).abs() < 1e-9);
        assert!((forecast[1] - (118.0 + 2.0 * mean_step)).abs() < 1e-9);
    }

    #[test]
    fn moving_average_stage_produces_a_usable_model() {
        let series = drifting_series(60);
        let order = ArimaOrder { p: 1, d: 1, q: 1 };
        let model = ArimaModel::fit(&series, &order).expect("fit");
        let forecast = model.forecast(5);
        assert_eq!(forecast.len(), 5);
        assert!(forecast.iter().all(|v| v.is_finite()));
    }
}
