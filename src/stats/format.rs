//! Number formatting for channel names
//!
//! Channel names are short, so every value is rendered as a plain string:
//! grouped thousands, a fixed number of decimals, and a unit ladder for the
//! network hash rate.

/// Hash rate units, smallest first. Scaling stops at the last entry.
pub const HASHRATE_UNITS: [&str; 6] = ["H/s", "Kh/s", "Mh/s", "Gh/s", "Th/s", "Ph/s"];

/// Format a number with `decimals` fixed decimal places and `,` between
/// thousands groups of the integer part.
///
/// ```
/// use chain_stats_bot::stats::format::format_grouped;
///
/// assert_eq!(format_grouped(1234567.891, 2), "1,234,567.89");
/// assert_eq!(format_grouped(999.0, 0), "999");
/// ```
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    // Rounding may have produced "-0.00"; only keep the sign for non-zero output
    if value.is_sign_negative() && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        grouped.push('-');
    }
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

/// Scale a raw hash rate (hashes per second) into a readable string.
///
/// Divides by 1000 while the value is at least 1000 and a larger unit is
/// available, then prints two decimals.
pub fn format_hashrate(hashrate: f64) -> String {
    let mut value = hashrate;
    let mut unit = 0;
    while value >= 1000.0 && unit < HASHRATE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.2} {}", value, HASHRATE_UNITS[unit])
}
