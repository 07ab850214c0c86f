use std::collections::BTreeMap;

/// Day-over-day delta outlier detection for one metric of one user.
///
/// `points` are (record id, value) pairs already coerced to numeric and
/// sorted by timestamp; rows that failed coercion must be dropped by the
/// caller before this sees them. Returns (record id, annotation fragment)
/// for every record whose delta falls outside the IQR fence, in
/// chronological order.
pub fn flag_metric(points: &[(i64, f64)], label: &str, multiplier: f64) -> Vec<(i64, String)> {
    if points.len() < 3 {
        return Vec::new();
    }

    // First differences: deltas[i] is the change arriving at points[i + 1].
    // The undefined difference at the head of the series never enters the
    // quantile statistics.
    let deltas: Vec<f64> = points.windows(2).map(|w| w[1].1 - w[0].1).collect();
    let (lower, upper) = iqr_bounds(&deltas, multiplier);

    let mut flagged = Vec::new();
    for (i, delta) in deltas.iter().enumerate() {
        if *delta < lower || *delta > upper {
            let (id, _) = points[i + 1];
            flagged.push((id, format_fragment(label, *delta)));
        }
    }
    flagged
}

/// Outlier fence over a delta series: [Q1 - k*IQR, Q3 + k*IQR].
pub fn iqr_bounds(deltas: &[f64], multiplier: f64) -> (f64, f64) {
    let mut sorted: Vec<f64> = deltas.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    (q1 - multiplier * iqr, q3 + multiplier * iqr)
}

/// Merge per-metric fragments into one annotation per record, "; "-joined in
/// the order the fragments were produced.
pub fn join_fragments(fragments: &[(i64, String)]) -> BTreeMap<i64, String> {
    let mut grouped: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
    for (id, fragment) in fragments {
        grouped.entry(*id).or_default().push(fragment.as_str());
    }
    grouped
        .into_iter()
        .map(|(id, parts)| (id, parts.join("; ")))
        .collect()
}

fn format_fragment(label: &str, delta: f64) -> String {
    let value = delta.round() as i64;
    let sign = if value > 0 { "+" } else { "" };
    format!("{label}: {sign}{}", group_digits(value))
}

/// Linear-interpolation quantile over an already-sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
            }
        }
    }
}

/// Render an integer with "," as the thousands separator.
fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[i64]) -> Vec<(i64, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as i64 + 1, *v as f64))
            .collect()
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let sorted = [-103.0, -3.0, 2.0, 5.0, 6.0, 105.0];
        assert!((quantile(&sorted, 0.25) - (-1.75)).abs() < 1e-9);
        assert!((quantile(&sorted, 0.75) - 5.75).abs() < 1e-9);
        assert_eq!(quantile(&sorted, 0.0), -103.0);
        assert_eq!(quantile(&sorted, 1.0), 105.0);
    }

    #[test]
    fn sharp_drop_is_the_only_flag_without_rebound() {
        let points = series(&[100, 105, 102, 108, 5, 8, 10]);
        let flagged = flag_metric(&points, "Followers", 1.5);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].0, 5);
        assert_eq!(flagged[0].1, "Followers: -103");
    }

    #[test]
    fn drop_and_rebound_are_both_flagged() {
        let points = series(&[100, 105, 102, 108, 5, 110, 112]);
        let flagged = flag_metric(&points, "Followers", 1.5);
        let ids: Vec<i64> = flagged.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![5, 6]);
        assert_eq!(flagged[0].1, "Followers: -103");
        assert_eq!(flagged[1].1, "Followers: +105");
    }

    #[test]
    fn short_series_yields_no_flags() {
        assert!(flag_metric(&series(&[100, 200]), "Followers", 1.5).is_empty());
        assert!(flag_metric(&[], "Followers", 1.5).is_empty());
    }

    #[test]
    fn steady_series_yields_no_flags() {
        let points = series(&[100, 102, 104, 106, 108, 110]);
        assert!(flag_metric(&points, "Followers", 1.5).is_empty());
    }

    #[test]
    fn fragments_carry_thousands_separators() {
        assert_eq!(format_fragment("Followers", 4000.0), "Followers: +4,000");
        assert_eq!(format_fragment("Posts", -1234567.0), "Posts: -1,234,567");
        assert_eq!(format_fragment("Following", 0.0), "Following: 0");
    }

    #[test]
    fn fragments_merge_per_record_in_order() {
        let fragments = vec![
            (5, "Followers: -103".to_string()),
            (5, "Posts: +40".to_string()),
            (2, "Following: +900".to_string()),
        ];
        let merged = join_fragments(&fragments);
        assert_eq!(merged[&5], "Followers: -103; Posts: +40");
        assert_eq!(merged[&2], "Following: +900");
    }

    #[test]
    fn multiplier_widens_the_fence() {
        let points = series(&[100, 104, 101, 106, 90, 108, 110]);
        let strict = flag_metric(&points, "Followers", 0.5);
        let lenient = flag_metric(&points, "Followers", 10.0);
        assert!(strict.len() >= lenient.len());
        assert!(lenient.is_empty());
    }
}
