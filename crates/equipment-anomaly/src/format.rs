//! Number and cell formatting shared by tooltips and the table view.

use crate::types::CellValue;

/// Fractional digits needed to print any `f64` exactly.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Format a number with a fixed number of decimals, the way a browser's
/// `Number.prototype.toFixed` does.
///
/// Non-finite values render as `Infinity`, `-Infinity` and `NaN` instead of
/// Rust's `inf` / `NaN`. Values exactly halfway between two candidates
/// round away from zero (`0.125` gives `"0.13"`), where Rust's formatter
/// would round to even.
pub fn to_fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    let digits = match exact_tie(magnitude, decimals) {
        Some(truncated) => increment_last_digit(&truncated),
        None => format!("{:.*}", decimals, magnitude),
    };
    format!("{sign}{digits}")
}

/// If `magnitude` lies exactly halfway between two `decimals`-place values,
/// return the lower one as text.
fn exact_tie(magnitude: f64, decimals: usize) -> Option<String> {
    // cheap filter before the exact expansion
    if !format!("{:.*}", decimals + 1, magnitude).ends_with('5') {
        return None;
    }

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, magnitude);
    let (whole, fraction) = exact.split_once('.')?;
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() != decimals + 1 || !fraction.ends_with('5') {
        return None;
    }

    Some(if decimals == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{}", &fraction[..decimals])
    })
}

/// Add one unit in the last place of a plain decimal string.
fn increment_last_digit(digits: &str) -> String {
    let mut bytes = digits.as_bytes().to_vec();
    for byte in bytes.iter_mut().rev() {
        match *byte {
            b'.' => continue,
            b'9' => *byte = b'0',
            _ => {
                *byte += 1;
                return String::from_utf8_lossy(&bytes).into_owned();
            }
        }
    }
    format!("1{}", String::from_utf8_lossy(&bytes))
}

/// Display text for a table cell.
///
/// Whole numbers print without decimals, other numbers with two, text is
/// shown verbatim and missing cells are blank.
pub fn display_cell(value: &CellValue) -> String {
    match value {
        CellValue::Number(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => {
            format!("{}", *x as i64)
        }
        CellValue::Number(x) => to_fixed(*x, 2),
        CellValue::Text(s) => s.clone(),
        CellValue::Missing => String::new(),
    }
}

/// Round to `decimals` places like Python's `round`: correctly rounded on
/// the exact binary value, with exact ties going to the even digit.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_finite() {
        assert_eq!(to_fixed(12.345, 1), "12.3");
        assert_eq!(to_fixed(84.0, 2), "84.00");
        assert_eq!(to_fixed(-7.25, 2), "-7.25");
    }

    #[test]
    fn test_to_fixed_ties_round_away_from_zero() {
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(0.25, 1), "0.3");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(-0.125, 2), "-0.13");
        assert_eq!(to_fixed(9.5, 0), "10");
        assert_eq!(to_fixed(0.5, 0), "1");
    }

    #[test]
    fn test_to_fixed_near_ties_use_exact_value() {
        // 1.005 is stored as 1.00499999999999989...
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(0.375, 2), "0.38");
    }

    #[test]
    fn test_to_fixed_non_finite() {
        assert_eq!(to_fixed(f64::INFINITY, 1), "Infinity");
        assert_eq!(to_fixed(f64::NEG_INFINITY, 1), "-Infinity");
        assert_eq!(to_fixed(f64::NAN, 2), "NaN");
    }

    #[test]
    fn test_display_cell() {
        assert_eq!(display_cell(&CellValue::Number(120.0)), "120");
        assert_eq!(display_cell(&CellValue::Number(3.14159)), "3.14");
        assert_eq!(display_cell(&CellValue::from("Valve")), "Valve");
        assert_eq!(display_cell(&CellValue::Missing), "");
        assert_eq!(display_cell(&CellValue::Number(f64::NAN)), "NaN");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345678, 2), 2.35);
        assert_eq!(round_to(7.0, 2), 7.0);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_round_to_ties_go_to_even() {
        assert_eq!(round_to(115.125, 2), 115.12);
        assert_eq!(round_to(-1.25, 1), -1.2);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(0.375, 2), 0.38);
    }
}
