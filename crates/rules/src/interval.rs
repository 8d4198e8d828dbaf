//! Threshold interval parsing.

use std::time::Duration;

/// Parse a human-readable duration string into a [`Duration`].
///
/// Supports components: `Xd` (days), `Xh` (hours), `Xm` (minutes), `Xs` (seconds).
/// Components can be combined: "2h30m", "1d12h", "90s". A bare number is
/// seconds. `"0"` and `"0s"` parse to [`Duration::ZERO`], the unbounded
/// interval. Returns `None` if the string is empty or unparseable.
pub fn parse_interval(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut total_secs: u64 = 0;
    let mut num_buf = String::new();
    let mut found_unit = false;

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            num_buf.push(ch);
        } else {
            let n: u64 = num_buf.parse().ok()?;
            num_buf.clear();
            let unit = match ch {
                'd' => 86_400,
                'h' => 3_600,
                'm' => 60,
                's' => 1,
                _ => return None,
            };
            total_secs = total_secs.checked_add(n.checked_mul(unit)?)?;
            found_unit = true;
        }
    }

    if !num_buf.is_empty() {
        if found_unit {
            // "30m15" is ambiguous.
            return None;
        }
        total_secs = num_buf.parse().ok()?;
    }

    Some(Duration::from_secs(total_secs))
}

/// Render a [`Duration`] back into the compact form accepted by [`parse_interval`].
pub fn format_interval(d: Duration) -> String {
    let mut secs = d.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    for (unit, size) in [('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_units() {
        assert_eq!(parse_interval("90s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_interval("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_interval("1h"), Some(Duration::from_secs(3_600)));
        assert_eq!(parse_interval("1d"), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn parse_combined() {
        assert_eq!(parse_interval("2h30m"), Some(Duration::from_secs(9_000)));
        assert_eq!(parse_interval("1d12h"), Some(Duration::from_secs(129_600)));
    }

    #[test]
    fn zero_means_unbounded() {
        assert_eq!(parse_interval("0"), Some(Duration::ZERO));
        assert_eq!(parse_interval("0s"), Some(Duration::ZERO));
    }

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!(parse_interval(" 45 "), Some(Duration::from_secs(45)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_interval(""), None);
        assert_eq!(parse_interval("5w"), None);
        assert_eq!(parse_interval("m"), None);
        assert_eq!(parse_interval("30m15"), None);
    }

    #[test]
    fn format_matches_parse() {
        assert_eq!(format_interval(Duration::from_secs(9_000)), "2h30m");
        assert_eq!(format_interval(Duration::ZERO), "0s");
        assert_eq!(format_interval(Duration::from_secs(61)), "1m1s");
    }

    #[test]
    fn formatted_interval_parses_back() {
        for secs in [0, 1, 59, 3_600, 86_400 + 5, 2 * 86_400 + 3 * 3_600 + 7] {
            let d = Duration::from_secs(secs);
            assert_eq!(parse_interval(&format_interval(d)), Some(d), "{secs}s");
        }
    }
}
