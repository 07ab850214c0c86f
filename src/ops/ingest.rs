use rusqlite::Connection;

use crate::analysis::normalize::parse_count;
use crate::analysis::risk::assess_profile;
use crate::models::config::RiskConfig;
use crate::models::snapshot::{NewSnapshot, ProfileSnapshot, RawSnapshot};
use crate::ops::db;

/// Store one freshly scraped snapshot: normalize the free-text counts, score
/// the profile's risk, and insert the row. Returns the stored record.
///
/// The (username, timestamp) pair is unique; re-ingesting the same capture is
/// a storage error, surfaced to the caller.
pub fn record_snapshot(
    conn: &Connection,
    raw: &RawSnapshot,
    config: &RiskConfig,
) -> Result<ProfileSnapshot, String> {
    let posts = parse_count(&raw.posts);
    let followers = parse_count(&raw.followers);
    let following = parse_count(&raw.following);
    let biography = raw.biography.clone().unwrap_or_default();

    let assessment = assess_profile(posts, followers, following, &biography, config);

    let snapshot = NewSnapshot {
        username: raw.username.clone(),
        timestamp: raw.timestamp,
        posts,
        followers,
        following,
        biography: raw.biography.clone(),
        risk_description: assessment.description.clone(),
        risk_level: assessment.level,
    };

    let id = db::insert_snapshot(conn, &snapshot)
        .map_err(|e| format!("Failed to store snapshot for {}: {e}", raw.username))?;

    log::info!(
        "stored snapshot {id} for {} (risk: {})",
        raw.username,
        assessment.level.as_str()
    );

    Ok(ProfileSnapshot {
        id,
        username: snapshot.username,
        timestamp: snapshot.timestamp,
        posts: posts.to_string(),
        followers: followers.to_string(),
        following: following.to_string(),
        biography: snapshot.biography,
        anomaly_annotation: None,
        risk_description: Some(assessment.description),
        risk_level: Some(assessment.level.as_str().to_string()),
    })
}
