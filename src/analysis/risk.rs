use crate::models::config::RiskConfig;
use crate::models::snapshot::{RiskAssessment, RiskLevel};

const LOW_RISK_DESCRIPTION: &str = "Low risk (based on basic heuristics)";

/// Score one snapshot's fields against the bot/suspicious-profile
/// heuristics. Points accumulate across independent rules; no history is
/// consulted and nothing here can fail — absent fields arrive as zero/empty
/// and simply score lower.
pub fn assess_profile(
    posts: u64,
    followers: u64,
    following: u64,
    biography: &str,
    config: &RiskConfig,
) -> RiskAssessment {
    let mut indicators: Vec<String> = Vec::new();
    let mut score: u32 = 0;

    if posts < 5 && followers > 500 {
        indicators.push("very few posts for the follower count".to_string());
        score += 3;
    } else if posts < 20 && followers > 5000 {
        indicators.push("relatively few posts for the follower count".to_string());
        score += 2;
    }

    if following > 0 && followers > 50 && (followers as f64 / following as f64) < 0.05 {
        indicators.push("follows far more accounts than follow back (low ratio)".to_string());
        score += 2;
    }
    if following > 4000 {
        indicators.push("follows a very high number of accounts (possible follow bot)".to_string());
        score += 2;
    }

    if posts == 0 && (followers > 10 || following > 10) {
        indicators.push("no posts but has follower/following activity".to_string());
        score += 1;
    }

    if !biography.is_empty() {
        let bio_lower = biography.to_lowercase();
        for keyword in &config.suspicious_keywords {
            if bio_lower.contains(keyword.as_str()) {
                indicators.push(format!("biography contains risky term: '{keyword}'"));
                score += 2;
                break;
            }
        }
        if bio_lower.contains("http://") || bio_lower.contains("https://") {
            indicators.push("biography contains URL(s), verify manually".to_string());
            score += 1;
        }
    }

    let level = if score >= 5 {
        RiskLevel::High
    } else if score >= 3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let description = if indicators.is_empty() {
        LOW_RISK_DESCRIPTION.to_string()
    } else {
        format!("Possible indicators: {}", indicators.join("; "))
    };

    RiskAssessment {
        score,
        indicators,
        description,
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RiskConfig {
        RiskConfig::default()
    }

    #[test]
    fn clean_profile_scores_zero_and_low() {
        let result = assess_profile(50, 200, 180, "", &config());
        assert_eq!(result.score, 0);
        assert_eq!(result.level, RiskLevel::Low);
        assert_eq!(result.description, LOW_RISK_DESCRIPTION);
        assert!(result.indicators.is_empty());
    }

    #[test]
    fn bot_like_profile_scores_high() {
        // Few posts + inverted ratio + mass following + risky bio + URL.
        let result = assess_profile(
            2,
            650,
            13500,
            "gana dinero rapido online! visita mi link! http://sitio-sospechoso.tk",
            &config(),
        );
        assert!(result.score >= 9, "score was {}", result.score);
        assert_eq!(result.level, RiskLevel::High);
        assert!(result.description.starts_with("Possible indicators:"));
    }

    #[test]
    fn few_posts_rules_are_mutually_exclusive() {
        // posts < 5 and followers > 5000 must only fire the stronger rule.
        let result = assess_profile(2, 6000, 100, "", &config());
        assert_eq!(
            result
                .indicators
                .iter()
                .filter(|i| i.contains("posts for the follower count"))
                .count(),
            1
        );
        assert_eq!(result.score, 3);
    }

    #[test]
    fn keyword_matching_stops_at_first_hit() {
        let result = assess_profile(40, 100, 100, "gratis crypto regalo", &config());
        let keyword_hits = result
            .indicators
            .iter()
            .filter(|i| i.contains("risky term"))
            .count();
        assert_eq!(keyword_hits, 1);
        assert_eq!(result.score, 2);
    }

    #[test]
    fn url_in_biography_adds_one_point() {
        let result = assess_profile(40, 100, 100, "see https://example.com", &config());
        assert_eq!(result.score, 1);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn no_posts_with_follow_activity_flags() {
        let result = assess_profile(0, 12, 0, "", &config());
        assert_eq!(result.score, 1);
        assert!(result.indicators[0].contains("no posts"));
    }

    #[test]
    fn level_thresholds_map_scores() {
        // Mass following alone: 2 points -> Low.
        let low = assess_profile(30, 40, 4500, "", &config());
        assert_eq!(low.score, 2);
        assert_eq!(low.level, RiskLevel::Low);

        // Mass following + inverted ratio: 4 points -> Medium.
        let medium = assess_profile(30, 100, 4500, "", &config());
        assert_eq!(medium.score, 4);
        assert_eq!(medium.level, RiskLevel::Medium);
    }
}
