//! Byte-size notation used by G1 log lines (`24M`, `1.5G`, `512K`, `8B`).
//!
//! Multiples are binary (1K = 1024 bytes), matching what HotSpot prints.

use super::model::FieldError;

pub const KB: u64 = 1 << 10;
pub const MB: u64 = 1 << 20;
pub const GB: u64 = 1 << 30;
pub const TB: u64 = 1 << 40;

/// Unit suffixes ordered largest first, so formatting picks the biggest exact unit.
const UNITS: [(char, u64); 5] = [('T', TB), ('G', GB), ('M', MB), ('K', KB), ('B', 1)];

/// Parse a size field such as `16M` into an exact byte count.
///
/// A bare number is taken as bytes. Fractional values (`1.5G`) are rounded
/// to the nearest byte.
pub fn parse_size(field: &'static str, raw: &str) -> Result<u64, FieldError> {
    let text = raw.trim();
    let invalid = || FieldError::InvalidSize {
        field,
        value: raw.to_string(),
    };

    let (number, multiplier) = match text.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => {
            let unit = c.to_ascii_uppercase();
            let multiplier = UNITS
                .iter()
                .find(|(u, _)| *u == unit)
                .map(|(_, m)| *m)
                .ok_or_else(invalid)?;
            (&text[..text.len() - 1], multiplier)
        }
        _ => (text, 1),
    };

    if number.is_empty() {
        return Err(invalid());
    }

    if let Ok(whole) = number.parse::<u64>() {
        return whole.checked_mul(multiplier).ok_or_else(invalid);
    }

    let value: f64 = number.replace(',', ".").parse().map_err(|_| invalid())?;
    let bytes = (value * multiplier as f64).round();
    if !bytes.is_finite() || bytes < 0.0 || bytes >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(bytes as u64)
}

/// Format a byte count with the largest unit that divides it exactly.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }
    for (unit, multiplier) in UNITS {
        if bytes % multiplier == 0 {
            return format!("{}{}", bytes / multiplier, unit);
        }
    }
    format!("{}B", bytes)
}

#[inline]
pub fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / MB as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_megabytes() {
        assert_eq!(parse_size("heap", "16M").unwrap(), 16_777_216);
    }

    #[test]
    fn test_size_round_trip_all_units() {
        for text in ["16K", "16M", "16G", "16T"] {
            let bytes = parse_size("heap", text).unwrap();
            assert_eq!(format_size(bytes), text, "round trip failed for {}", text);
        }
    }

    #[test]
    fn test_parse_bare_bytes_and_lowercase_unit() {
        assert_eq!(parse_size("heap", "512").unwrap(), 512);
        assert_eq!(parse_size("heap", "512B").unwrap(), 512);
        assert_eq!(parse_size("heap", "2m").unwrap(), 2 * MB);
    }

    #[test]
    fn test_parse_fractional() {
        assert_eq!(parse_size("heap", "1.5G").unwrap(), GB + GB / 2);
        assert_eq!(parse_size("heap", "0,5K").unwrap(), 512);
    }

    #[test]
    fn test_format_falls_back_to_smaller_unit() {
        assert_eq!(format_size(MB + MB / 2), "1536K");
        assert_eq!(format_size(1000), "1000B");
        assert_eq!(format_size(0), "0B");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_size("heap", "1.2.3M").is_err());
        assert!(parse_size("heap", "M").is_err());
        assert!(parse_size("heap", "12X").is_err());
        assert!(parse_size("heap", "").is_err());
        assert!(parse_size("heap", "99999999999999999999T").is_err());
    }

    #[test]
    fn test_to_mb() {
        assert_eq!(to_mb(10 * MB), 10.0);
    }
}
