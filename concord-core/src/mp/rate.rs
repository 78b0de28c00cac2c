// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::fmt;

use crate::constant::RATE_SIGNIFICANT_DIGITS;

/// A ratio that may be undefined because its denominator is zero
///
/// # Examples
///
/// ```
/// use concord_core::mp::Rate;
///
/// assert_eq!(Rate::ratio(1, 3).to_string(), "0.33333");
/// assert_eq!(Rate::ratio(4, 4).to_string(), "1");
/// assert_eq!(Rate::ratio(0, 0).to_string(), "NA");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    NotApplicable,
    Value(f64),
}

impl Rate {
    /// `numerator / denominator`, or `NotApplicable` when the denominator is zero
    pub fn ratio(numerator: u64, denominator: u64) -> Rate {
        if denominator == 0 {
            Rate::NotApplicable
        } else {
            Rate::Value(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Rate::NotApplicable => None,
            Rate::Value(v) => Some(*v),
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Rate::Value(_))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rate::NotApplicable => write!(f, "NA"),
            Rate::Value(v) => write!(f, "{}", format_significant(*v, RATE_SIGNIFICANT_DIGITS)),
        }
    }
}

/// Format a value with `digits` significant digits like C's `%g`
///
/// Fixed notation is used when the decimal exponent lies in
/// `[-4, digits)`, scientific notation otherwise. Trailing zeros and a
/// trailing decimal point are removed.
///
/// # Examples
///
/// ```
/// use concord_core::mp::format_significant;
///
/// assert_eq!(format_significant(0.123456, 5), "0.12346");
/// assert_eq!(format_significant(123456.0, 5), "1.2346e+05");
/// assert_eq!(format_significant(0.00001234, 5), "1.234e-05");
/// assert_eq!(format_significant(100.0, 5), "100");
/// ```
pub fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }

    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1);

    // Rounding to `digits` may carry into the next power of ten, so the
    // exponent is read back from the rounded scientific representation.
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (digits as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_format_significant_fixed() {
        assert_eq!(format_significant(1.0, 5), "1");
        assert_eq!(format_significant(0.5, 5), "0.5");
        assert_eq!(format_significant(0.999996, 5), "1");
        assert_eq!(format_significant(12345.4, 5), "12345");
        assert_eq!(format_significant(-0.25, 5), "-0.25");
        assert_eq!(format_significant(0.0001, 5), "0.0001");
    }

    #[test]
    fn test_format_significant_scientific() {
        assert_eq!(format_significant(99999.6, 5), "1e+05");
        assert_eq!(format_significant(0.00001, 5), "1e-05");
        assert_eq!(format_significant(1.5e-120, 5), "1.5e-120");
    }

    #[test]
    fn test_format_significant_special() {
        assert_eq!(format_significant(0.0, 5), "0");
        assert_eq!(format_significant(f64::NAN, 5), "nan");
        assert_eq!(format_significant(f64::NEG_INFINITY, 5), "-inf");
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(Rate::NotApplicable.to_string(), "NA");
        assert_eq!(Rate::Value(2.0 / 3.0).to_string(), "0.66667");
        assert_eq!(Rate::ratio(3, 0), Rate::NotApplicable);
        assert_eq!(Rate::ratio(3, 4).value(), Some(0.75));
    }
}
