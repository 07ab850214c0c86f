use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::analysis::arima::ArimaModel;
use crate::models::config::ForecastConfig;
use crate::models::snapshot::ForecastPoint;

/// Forecast the next `horizon` values of one user's follower series.
///
/// `points` are (day, value) observations in any order; multiple snapshots on
/// the same day collapse to the latest one. Returns an empty vector — never
/// an error — when the series is too short for the configured model order or
/// when the fit fails; the diagnostic goes to the log instead of the caller.
pub fn forecast_series(
    points: &[(NaiveDate, f64)],
    horizon: usize,
    config: &ForecastConfig,
) -> Vec<ForecastPoint> {
    if horizon == 0 {
        return Vec::new();
    }

    // One value per distinct day, latest snapshot wins.
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, value) in points {
        if value.is_finite() {
            by_day.insert(*date, *value);
        }
    }
    let observed: Vec<(NaiveDate, f64)> = by_day.into_iter().collect();

    let required = config.min_observations().max(2);
    if observed.len() < required {
        log::info!(
            "insufficient history for a forecast: {} observations, {} required",
            observed.len(),
            required
        );
        return Vec::new();
    }

    let dates: Vec<NaiveDate> = observed.iter().map(|(d, _)| *d).collect();
    let gaps: Vec<i64> = dates.windows(2).map(|w| (w[1] - w[0]).num_days()).collect();

    let mut values: Vec<f64> = observed.iter().map(|(_, v)| *v).collect();
    let step_days = match infer_step(&gaps) {
        Step::Uniform(days) => days,
        Step::MedianDaily => {
            // Irregular gaps but a one-day median: force a daily grid and
            // forward-fill the missing days.
            values = pad_daily(&observed);
            1
        }
        Step::Irregular(days) => {
            log::warn!(
                "could not infer a regular frequency; forecast dates advance by \
                 {days} day(s) and may be approximate"
            );
            days
        }
    };

    let model = match ArimaModel::fit(&values, &config.order) {
        Ok(model) => model,
        Err(err) => {
            log::debug!("follower model fit failed: {err}");
            return Vec::new();
        }
    };

    let predicted = model.forecast(horizon);
    if predicted.len() != horizon || predicted.iter().any(|v| !v.is_finite()) {
        log::debug!("follower forecast produced unusable values, dropping it");
        return Vec::new();
    }

    let last_date = dates[dates.len() - 1];
    predicted
        .into_iter()
        .enumerate()
        .map(|(i, value)| ForecastPoint {
            date: last_date + Duration::days(step_days * (i as i64 + 1)),
            value,
        })
        .collect()
}

enum Step {
    /// Every observed gap is the same number of days.
    Uniform(i64),
    /// Gaps vary but the median is exactly one day.
    MedianDaily,
    /// Gaps vary and the median is not daily; best effort.
    Irregular(i64),
}

fn infer_step(gaps: &[i64]) -> Step {
    let first = gaps.first().copied().unwrap_or(1).max(1);
    if gaps.iter().all(|g| *g == first) {
        return Step::Uniform(first);
    }

    let mut sorted = gaps.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    };

    if (median - 1.0).abs() < f64::EPSILON {
        Step::MedianDaily
    } else {
        Step::Irregular((median.round() as i64).max(1))
    }
}

/// Expand an observed series onto a contiguous daily grid, carrying the
/// previous value across missing days.
fn pad_daily(observed: &[(NaiveDate, f64)]) -> Vec<f64> {
    let mut values = Vec::with_capacity(observed.len());
    let Some(&(first_date, first_value)) = observed.first() else {
        return values;
    };
    let mut cursor = first_date;
    let mut previous = first_value;
    for &(date, value) in observed {
        while cursor < date {
            values.push(previous);
            cursor = cursor + Duration::days(1);
        }
        values.push(value);
        previous = value;
        cursor = date + Duration::days(1);
    }
    values
}
