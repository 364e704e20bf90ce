//! Time formatting helpers.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Short human-readable form of a duration in seconds, keeping the two
/// largest non-zero units, e.g. `3d 4h`, `2m 5s`, `45s`.
pub fn format_duration(secs: u64) -> String {
    let mut rest = secs;
    let parts: Vec<String> = UNITS
        .iter()
        .filter_map(|&(size, suffix)| {
            let count = rest / size;
            rest %= size;
            (count > 0).then(|| format!("{count}{suffix}"))
        })
        .take(2)
        .collect();
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Voting time left on a proposal: `ends in 3d 4h`, or `ended` once it is over.
pub fn format_remaining(secs: u64) -> String {
    if secs == 0 {
        "ended".to_string()
    } else {
        format!("ends in {}", format_duration(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_two_largest_units() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(7_260), "2h 1m");
        assert_eq!(format_duration(3 * 86_400 + 4 * 3_600 + 59), "3d 4h");
    }

    #[test]
    fn zero_units_are_skipped() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(86_400 + 5), "1d 5s");
        assert_eq!(format_duration(3_600), "1h");
    }

    #[test]
    fn remaining_reads_ended_at_zero() {
        assert_eq!(format_remaining(0), "ended");
        assert_eq!(format_remaining(90), "ends in 1m 30s");
    }
}
