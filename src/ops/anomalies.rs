use std::collections::BTreeMap;

use rusqlite::Connection;

use crate::analysis::anomaly::{flag_metric, join_fragments};
use crate::models::config::AnomalyConfig;
use crate::models::snapshot::ProfileSnapshot;
use crate::ops::db;

/// What a batch refresh touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyRefreshSummary {
    pub users_analyzed: usize,
    pub flagged_records: usize,
}

/// The tracked metrics in detection order; the fragment label doubles as the
/// display name.
const TRACKED_METRICS: [(&str, fn(&ProfileSnapshot) -> &str); 3] = [
    ("Followers", |s| s.followers.as_str()),
    ("Posts", |s| s.posts.as_str()),
    ("Following", |s| s.following.as_str()),
];

/// Recompute every anomaly annotation from the full stored history.
///
/// Annotations are derived data: the whole column is rebuilt in memory and
/// swapped in atomically, so rerunning on unchanged data is idempotent and a
/// record flagged yesterday loses its flag if today's statistics no longer
/// support it. Only a storage failure is an error; an empty table is a no-op.
///
/// Not safe to run concurrently with itself against the same database — the
/// caller serializes batch refreshes.
pub fn refresh_anomalies(
    conn: &Connection,
    config: &AnomalyConfig,
) -> Result<AnomalyRefreshSummary, String> {
    let snapshots = db::load_all_snapshots(conn)
        .map_err(|e| format!("Failed to read snapshot history: {e}"))?;

    if snapshots.is_empty() {
        log::info!("no snapshot history to analyze");
        return Ok(AnomalyRefreshSummary {
            users_analyzed: 0,
            flagged_records: 0,
        });
    }

    let mut fragments: Vec<(i64, String)> = Vec::new();
    let mut users_analyzed = 0usize;

    for group in user_groups(&snapshots) {
        if group.len() < config.min_history {
            continue;
        }
        users_analyzed += 1;

        for (label, metric) in TRACKED_METRICS {
            // Coerce the stored text to numeric, dropping rows that fail;
            // the kept rows stay tied to their record ids.
            let points: Vec<(i64, f64)> = group
                .iter()
                .filter_map(|s| metric(s).trim().parse::<f64>().ok().map(|v| (s.id, v)))
                .collect();
            if points.len() < config.min_history {
                continue;
            }
            fragments.extend(flag_metric(&points, label, config.iqr_multiplier));
        }
    }

    let annotations: BTreeMap<i64, String> = join_fragments(&fragments);
    db::apply_anomaly_annotations(conn, &annotations)
        .map_err(|e| format!("Failed to write anomaly annotations: {e}"))?;

    log::info!(
        "anomaly refresh complete: {} of {} records flagged across {} users",
        annotations.len(),
        snapshots.len(),
        users_analyzed
    );

    Ok(AnomalyRefreshSummary {
        users_analyzed,
        flagged_records: annotations.len(),
    })
}

/// Split the username-then-timestamp ordered snapshot list into per-user runs.
fn user_groups(snapshots: &[ProfileSnapshot]) -> Vec<&[ProfileSnapshot]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=snapshots.len() {
        if i == snapshots.len() || snapshots[i].username != snapshots[start].username {
            groups.push(&snapshots[start..i]);
            start = i;
        }
    }
    groups
}
