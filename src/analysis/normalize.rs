/// Parse a displayed count ("1.2k", "1,234", "154 seguidores") into a
/// non-negative integer. Never fails; anything unparseable becomes 0.
///
/// Without a magnitude suffix both "," and "." are read as grouping
/// separators, so "1.234" parses as 1234. That is an approximation accepted
/// for this domain — social counts are integers — not a general numeric
/// parser.
pub fn parse_count(raw: &str) -> u64 {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | 'k' | 'm'))
        .collect();

    if cleaned.is_empty() {
        return 0;
    }

    if let Some(idx) = cleaned.find(|c| c == 'k' || c == 'm') {
        let scale = if cleaned[idx..].starts_with('k') {
            1_000.0
        } else {
            1_000_000.0
        };
        // Before the suffix "," is a grouping separator and "." a decimal
        // point: "1.2k" -> 1200, "12,5k" stays unsupported and falls to 0.
        let prefix: String = cleaned[..idx].chars().filter(|c| *c != ',').collect();
        return match prefix.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => (v * scale).floor() as u64,
            _ => 0,
        };
    }

    let digits: String = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().unwrap_or(0)
}
