use rusqlite::Connection;

use crate::analysis::forecast::forecast_series;
use crate::models::config::ForecastConfig;
use crate::models::snapshot::ForecastPoint;
use crate::ops::db;

/// Forecast one user's follower count for the next `horizon` days from their
/// stored history.
///
/// Returns `Ok(vec![])` when the history is too short or the model fit fails;
/// only a storage failure is an error. The result is ephemeral — nothing is
/// written back.
pub fn forecast_followers(
    conn: &Connection,
    username: &str,
    horizon: usize,
    config: &ForecastConfig,
) -> Result<Vec<ForecastPoint>, String> {
    let history = db::load_user_history(conn, username)
        .map_err(|e| format!("Failed to read history for {username}: {e}"))?;

    let points: Vec<(chrono::NaiveDate, f64)> = history
        .iter()
        .filter_map(|s| {
            s.followers
                .trim()
                .parse::<f64>()
                .ok()
                .map(|v| (s.timestamp.date(), v))
        })
        .collect();

    Ok(forecast_series(&points, horizon, config))
}
