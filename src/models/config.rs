/// Tuning knobs for the delta-outlier detector.
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    /// Multiplier applied to the interquartile range when building the
    /// outlier bounds. 1.5 is the conventional fence; lower is stricter.
    pub iqr_multiplier: f64,
    /// Minimum valid points a user/metric series needs before any analysis
    /// is attempted.
    pub min_history: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        AnomalyConfig {
            iqr_multiplier: 1.5,
            min_history: 3,
        }
    }
}

/// Tuning knobs for the heuristic risk scorer.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Lowercase terms that mark a biography as suspicious. Matching is
    /// case-insensitive substring and stops at the first hit.
    pub suspicious_keywords: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            suspicious_keywords: default_suspicious_keywords(),
        }
    }
}

/// Default biography keyword list. The scraped profiles are mostly
/// Spanish-language, so the list keeps the Spanish terms with a few English
/// equivalents.
pub fn default_suspicious_keywords() -> Vec<String> {
    [
        "gana dinero",
        "crypto",
        "inversión",
        "regalo",
        "gratis",
        "seguidores ya",
        "click aquí",
        "oferta limitada",
        "soporte técnico",
        "enlace en mi bio para",
        "earn money fast",
        "free followers",
        "limited offer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// The (p, d, q) order of the follower-growth model: autoregressive depth,
/// differencing steps, moving-average depth.
#[derive(Debug, Clone, Copy)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn total(&self) -> usize {
        self.p + self.d + self.q
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        ArimaOrder { p: 5, d: 1, q: 0 }
    }
}

/// Tuning knobs for the follower-growth forecaster.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub order: ArimaOrder,
    /// Observations required beyond the order total before a fit is
    /// attempted. Shorter series return an empty forecast.
    pub extra_observations: usize,
}

impl ForecastConfig {
    pub fn min_observations(&self) -> usize {
        self.order.total() + self.extra_observations
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            order: ArimaOrder::default(),
            extra_observations: 5,
        }
    }
}
