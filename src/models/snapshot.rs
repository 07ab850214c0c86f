use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One stored measurement of a profile's public metrics.
///
/// The three count columns are persisted as text (the table predates
/// normalization) but hold integer values after ingestion; analysis re-coerces
/// them and drops rows that fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub id: i64,
    pub username: String,
    pub timestamp: NaiveDateTime,
    pub posts: String,
    pub followers: String,
    pub following: String,
    pub biography: Option<String>,
    pub anomaly_annotation: Option<String>,
    pub risk_description: Option<String>,
    pub risk_level: Option<String>,
}

/// A raw snapshot as delivered by the ingestion side. Count fields may be
/// free text ("1.2k", "650 seguidores"); they are normalized before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub username: String,
    pub posts: String,
    pub followers: String,
    pub following: String,
    pub biography: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// Normalized insert payload for one snapshot row.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
    pub username: String,
    pub timestamp: NaiveDateTime,
    pub posts: u64,
    pub followers: u64,
    pub following: u64,
    pub biography: Option<String>,
    pub risk_description: String,
    pub risk_level: RiskLevel,
}

/// Categorical risk severity derived from the heuristic point score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Outcome of scoring a single snapshot's fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub indicators: Vec<String>,
    pub description: String,
    pub level: RiskLevel,
}

/// One forecasted (date, value) pair. Values are floating point; callers may
/// round for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}
