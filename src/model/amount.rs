//! Exact decimal handling for amounts.
//!
//! Amounts travel through the pipeline as decimal strings. Fixed-point chain values are turned
//! into decimal strings with [`normalize`], which works on the digits themselves so that token
//! magnitudes far beyond any machine integer stay exact. Exchange values and percentages go
//! through `Decimal`. Chain amounts can carry more significant digits than `Decimal` holds, so
//! comparisons and sums over them go through `BigDecimal`. Binary floating point is never used.

use crate::Result;
use anyhow::{ensure, Context};
use bigdecimal::BigDecimal;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Converts a raw integer `magnitude` scaled by `10^places` into the shortest decimal string
/// representing it.
///
/// Trailing fractional zeros and a dangling decimal point are removed, as are leading zeros of
/// the integer part.
///
/// # Examples
/// ```
/// # use koinly_convert::model::amount::normalize;
/// assert_eq!(normalize("1000000000000000000", 18).unwrap(), "1");
/// assert_eq!(normalize("123450000000000000", 18).unwrap(), "0.12345");
/// assert_eq!(normalize("42", 0).unwrap(), "42");
/// ```
///
/// # Errors
/// A `magnitude` that is not made of ASCII digits only is a caller bug and is reported as an
/// error that should abort the run.
pub fn normalize(magnitude: &str, places: u32) -> Result<String> {
    let digits = magnitude.trim();
    ensure!(
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        "'{magnitude}' is not an unsigned integer magnitude"
    );

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(String::from("0"));
    }

    let places = places as usize;
    if places == 0 {
        return Ok(digits.to_string());
    }

    // Make sure there is at least one digit left of the decimal point.
    let padded = if digits.len() <= places {
        format!("{}{digits}", "0".repeat(places + 1 - digits.len()))
    } else {
        digits.to_string()
    };

    let (integer, fraction) = padded.split_at(padded.len() - places);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        Ok(integer.to_string())
    } else {
        Ok(format!("{integer}.{fraction}"))
    }
}

/// Parses a decimal string exactly. Scientific notation is accepted.
pub fn parse(s: &str) -> Result<Decimal> {
    let trimmed = s.trim();
    let parsed = if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed)
    } else {
        Decimal::from_str(trimmed)
    };
    parsed.with_context(|| format!("'{s}' is not a decimal amount"))
}

/// Parses a decimal string, treating an empty string as zero.
pub fn parse_or_zero(s: &str) -> Result<Decimal> {
    if s.trim().is_empty() {
        Ok(Decimal::ZERO)
    } else {
        parse(s)
    }
}

/// Formats a `Decimal` without exponent and without trailing zeros.
pub fn format(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Computes `percent`% of `amount` exactly and formats the result.
pub fn percent_of(percent: Decimal, amount: &str) -> Result<String> {
    let value = parse(amount)?;
    let fee = value
        .checked_mul(percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .with_context(|| format!("Overflow computing {percent}% of {amount}"))?;
    Ok(format(fee))
}

/// Parses a decimal string of any precision. Scientific notation is accepted.
pub fn parse_exact(s: &str) -> Result<BigDecimal> {
    BigDecimal::from_str(s.trim()).with_context(|| format!("'{s}' is not a decimal amount"))
}

/// Formats a `BigDecimal` without exponent and without trailing zeros.
pub fn format_exact(value: &BigDecimal) -> String {
    value.normalized().to_plain_string()
}

/// Returns true when `received` is greater than or equal to `sent`.
pub fn covers(received: &str, sent: &str) -> Result<bool> {
    Ok(parse_exact(received)? >= parse_exact(sent)?)
}

/// Returns true when `a` and `b` are the same value, whatever their scale.
pub fn same(a: &str, b: &str) -> Result<bool> {
    Ok(parse_exact(a)? == parse_exact(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whole_unit() {
        assert_eq!(normalize("1000000000000000000", 18).unwrap(), "1");
    }

    #[test]
    fn test_normalize_fraction() {
        assert_eq!(normalize("123450000000000000", 18).unwrap(), "0.12345");
    }

    #[test]
    fn test_normalize_zero_places() {
        assert_eq!(normalize("1200", 0).unwrap(), "1200");
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(normalize("0", 18).unwrap(), "0");
        assert_eq!(normalize("000", 6).unwrap(), "0");
    }

    #[test]
    fn test_normalize_tiny_amount() {
        assert_eq!(normalize("1", 18).unwrap(), "0.000000000000000001");
    }

    #[test]
    fn test_normalize_beyond_machine_precision() {
        let magnitude = "123456789012345678901234567890123456789";
        let actual = normalize(magnitude, 18).unwrap();
        assert_eq!(actual, "123456789012345678901.234567890123456789");
        assert_eq!(actual.replace('.', ""), magnitude);
    }

    #[test]
    fn test_normalize_never_leaves_trailing_zero_or_point() {
        for (magnitude, places) in [("10", 1), ("2500", 2), ("1010", 3), ("7000000", 6)] {
            let actual = normalize(magnitude, places).unwrap();
            assert!(!actual.ends_with('.'), "{actual}");
            if actual.contains('.') {
                assert!(!actual.ends_with('0'), "{actual}");
            }
        }
        assert_eq!(normalize("2500", 2).unwrap(), "25");
        assert_eq!(normalize("1010", 3).unwrap(), "1.01");
    }

    #[test]
    fn test_normalize_scales_back_to_magnitude() {
        let magnitude = "98765432100000";
        let places = 9;
        let actual = parse(&normalize(magnitude, places).unwrap()).unwrap();
        let rescaled = actual * Decimal::from(10u64.pow(places));
        assert_eq!(rescaled, Decimal::from_str(magnitude).unwrap());
    }

    #[test]
    fn test_normalize_rejects_non_numeric() {
        assert!(normalize("12a", 2).is_err());
        assert!(normalize("-5", 2).is_err());
        assert!(normalize("", 2).is_err());
    }

    #[test]
    fn test_percent_of_is_exact() {
        let percent = Decimal::from_str("1.5").unwrap();
        assert_eq!(percent_of(percent, "200").unwrap(), "3");
        let percent = Decimal::from_str("0.1").unwrap();
        assert_eq!(percent_of(percent, "0.3").unwrap(), "0.0003");
    }

    #[test]
    fn test_covers() {
        assert!(covers("10", "10").unwrap());
        assert!(covers("10.000001", "10").unwrap());
        assert!(!covers("9.999999", "10").unwrap());
        assert!(covers("x", "10").is_err());
    }

    #[test]
    fn test_covers_beyond_decimal_precision() {
        let smaller = normalize("1000000000000000000000000000001", 18).unwrap();
        let larger = normalize("1000000000000000000000000000002", 18).unwrap();
        assert!(!covers(&smaller, &larger).unwrap());
        assert!(covers(&larger, &smaller).unwrap());
        assert!(covers(&larger, &larger).unwrap());
    }

    #[test]
    fn test_same() {
        assert!(same("1.50", "1.5").unwrap());
        assert!(same("1e3", "1000").unwrap());
        assert!(!same(
            "123456789012345678901.234567890123456789",
            "123456789012345678901.234567890123456788"
        )
        .unwrap());
        assert!(same("", "1").is_err());
    }

    #[test]
    fn test_parse_exact_keeps_every_digit() {
        let magnitude = "123456789012345678901234567890123456789";
        let value = parse_exact(&normalize(magnitude, 18).unwrap()).unwrap();
        assert_eq!(
            format_exact(&value),
            "123456789012345678901.234567890123456789"
        );
        assert_eq!(format_exact(&parse_exact("2.500").unwrap()), "2.5");
        assert_eq!(format_exact(&parse_exact("1e2").unwrap()), "100");
        assert_eq!(format_exact(&parse_exact("-0.0").unwrap()), "0");
    }

    #[test]
    fn test_format_strips_zeros() {
        assert_eq!(format(Decimal::from_str("1.2300").unwrap()), "1.23");
        assert_eq!(format(Decimal::from_str("-0.000").unwrap()), "0");
    }

    #[test]
    fn test_parse_scientific() {
        assert_eq!(parse("1e-3").unwrap(), Decimal::from_str("0.001").unwrap());
    }

    #[test]
    fn test_parse_or_zero() {
        assert_eq!(parse_or_zero(" ").unwrap(), Decimal::ZERO);
        assert!(parse_or_zero("abc").is_err());
    }
}
