use crate::models::snapshot::{NewSnapshot, ProfileSnapshot};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result};
use std::collections::BTreeMap;

const DB_SCHEMA_VERSION: i64 = 1;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        // Future schema; do not fail reads/writes for forward-compatible changes.
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            posts TEXT NOT NULL DEFAULT '0',
            followers TEXT NOT NULL DEFAULT '0',
            following TEXT NOT NULL DEFAULT '0',
            biography TEXT,
            anomaly_annotation TEXT,
            risk_description TEXT,
            risk_level TEXT CHECK(risk_level IN ('Low', 'Medium', 'High')),
            UNIQUE(username, timestamp)
        );

        CREATE INDEX IF NOT EXISTS idx_snapshots_username_timestamp
            ON snapshots(username, timestamp);
        ",
    )
}

pub fn open(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

pub fn insert_snapshot(conn: &Connection, snapshot: &NewSnapshot) -> Result<i64> {
    conn.execute(
        "INSERT INTO snapshots (
            username, timestamp, posts, followers, following, biography,
            anomaly_annotation, risk_description, risk_level
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8)",
        params![
            snapshot.username,
            snapshot.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            snapshot.posts.to_string(),
            snapshot.followers.to_string(),
            snapshot.following.to_string(),
            snapshot.biography.as_deref(),
            snapshot.risk_description,
            snapshot.risk_level.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Every stored snapshot, ordered by user then timestamp — the detector's
/// full-history input.
pub fn load_all_snapshots(conn: &Connection) -> Result<Vec<ProfileSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, timestamp, posts, followers, following, biography,
                anomaly_annotation, risk_description, risk_level
         FROM snapshots ORDER BY username ASC, timestamp ASC",
    )?;
    let rows = stmt.query_map([], map_snapshot_row)?;
    Ok(rows.filter_map(|r| r.ok()).flatten().collect())
}

/// One user's history ordered by timestamp.
pub fn load_user_history(conn: &Connection, username: &str) -> Result<Vec<ProfileSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, timestamp, posts, followers, following, biography,
                anomaly_annotation, risk_description, risk_level
         FROM snapshots WHERE username = ?1 ORDER BY timestamp ASC",
    )?;
    let rows = stmt.query_map(params![username], map_snapshot_row)?;
    Ok(rows.filter_map(|r| r.ok()).flatten().collect())
}

/// Distinct tracked usernames, for profile selectors.
pub fn list_usernames(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT username FROM snapshots ORDER BY username ASC")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// Drop every anomaly annotation. `apply_anomaly_annotations` already clears
/// before it writes; this is the standalone reset for callers that want a
/// blank slate without a recompute.
pub fn clear_anomaly_annotations(conn: &Connection) -> Result<()> {
    conn.execute("UPDATE snapshots SET anomaly_annotation = NULL", [])?;
    Ok(())
}

/// Replace the whole annotation column: clear every row, then write the given
/// annotations, as one transaction so no reader observes the cleared-but-not-
/// rewritten intermediate state.
pub fn apply_anomaly_annotations(
    conn: &Connection,
    annotations: &BTreeMap<i64, String>,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE snapshots SET anomaly_annotation = NULL", [])?;
    {
        let mut stmt =
            tx.prepare("UPDATE snapshots SET anomaly_annotation = ?1 WHERE id = ?2")?;
        for (id, annotation) in annotations {
            stmt.execute(params![annotation, id])?;
        }
    }
    tx.commit()
}

type SnapshotRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn map_snapshot_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Option<ProfileSnapshot>> {
    let raw: SnapshotRow = (
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    );
    Ok(hydrate_snapshot(raw))
}

fn hydrate_snapshot(raw: SnapshotRow) -> Option<ProfileSnapshot> {
    let (id, username, timestamp, posts, followers, following, biography, annotation, risk_desc, risk_level) =
        raw;
    let timestamp = parse_timestamp(&timestamp).or_else(|| {
        log::warn!("snapshot {id} has an unparseable timestamp, skipping it");
        None
    })?;
    Some(ProfileSnapshot {
        id,
        username,
        timestamp,
        posts,
        followers,
        following,
        biography,
        anomaly_annotation: annotation,
        risk_description: risk_desc,
        risk_level,
    })
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Some(parsed);
    }
    // Day-granularity rows written by older collectors.
    chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
