//! Parsing of object sizes with byte-magnitude suffixes.
//!
//! Sizes are given as a number followed by a unit, e.g. `512K`, `1M` or `1.5GiB`. All units are
//! powers of 1024, regardless of whether they are spelled `M`, `MB` or `MiB`. Units are matched
//! case-insensitively. A unit is required, and the resulting size must be positive.

use bytesize::ByteSize;
use thiserror::Error;

/// Errors returned by [`parse_size`].
#[derive(Debug, Error, PartialEq)]
pub enum SizeError {
    /// The input does not start with a number.
    #[error("missing number in `{0}`")]
    MissingNumber(String),

    /// The numeric part could not be parsed.
    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    /// The input has no unit, or an unknown one.
    #[error("byte quantity `{0}` must have a unit of B, K, M, G or T")]
    InvalidUnit(String),

    /// The size evaluates to zero bytes.
    #[error("byte quantity `{0}` must be positive")]
    NotPositive(String),
}

/// Parses a size string into a [`ByteSize`].
pub fn parse_size(input: &str) -> Result<ByteSize, SizeError> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    if number.is_empty() {
        return Err(SizeError::MissingNumber(input.to_owned()));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| SizeError::InvalidNumber(number.to_owned()))?;
    let multiplier =
        unit_multiplier(unit.trim()).ok_or_else(|| SizeError::InvalidUnit(input.to_owned()))?;

    let bytes = (value * multiplier as f64).round() as u64;
    if bytes == 0 {
        return Err(SizeError::NotPositive(input.to_owned()));
    }

    Ok(ByteSize::b(bytes))
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "B" => 1,
        "K" | "KB" | "KIB" => 1 << 10,
        "M" | "MB" | "MIB" => 1 << 20,
        "G" | "GB" | "GIB" => 1 << 30,
        "T" | "TB" | "TIB" => 1 << 40,
        _ => return None,
    };
    Some(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixes() {
        assert_eq!(parse_size("100B").unwrap().as_u64(), 100);
        assert_eq!(parse_size("4K").unwrap().as_u64(), 4096);
        assert_eq!(parse_size("1M").unwrap().as_u64(), 1_048_576);
        assert_eq!(parse_size("1mb").unwrap().as_u64(), 1_048_576);
        assert_eq!(parse_size("1MiB").unwrap().as_u64(), 1_048_576);
        assert_eq!(parse_size("2G").unwrap().as_u64(), 2 * 1_073_741_824);
        assert_eq!(parse_size("1T").unwrap().as_u64(), 1_099_511_627_776);
    }

    #[test]
    fn parses_fractions_and_whitespace() {
        assert_eq!(parse_size("1.5K").unwrap().as_u64(), 1536);
        assert_eq!(parse_size(" 8 M ").unwrap().as_u64(), 8 * 1_048_576);
    }

    #[test]
    fn rejects_invalid_sizes() {
        assert_eq!(
            parse_size("1024"),
            Err(SizeError::InvalidUnit("1024".into()))
        );
        assert_eq!(parse_size("M"), Err(SizeError::MissingNumber("M".into())));
        assert_eq!(
            parse_size("1.2.3M"),
            Err(SizeError::InvalidNumber("1.2.3".into()))
        );
        assert_eq!(parse_size("5X"), Err(SizeError::InvalidUnit("5X".into())));
        assert_eq!(parse_size("0K"), Err(SizeError::NotPositive("0K".into())));
        assert!(parse_size("-1M").is_err());
    }
}
