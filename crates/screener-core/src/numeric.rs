//! Lenient numeric coercion for values that arrive as JSON or CSV text.
//!
//! Anything that cannot be read as a number, or reads as NaN, is treated as
//! unknown rather than an error.

use serde_json::Value;

/// Parse a text cell into a number. Empty, non-numeric and NaN cells are unknown.
pub fn parse_f64(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Coerce a JSON value (number or numeric string) into a number.
pub fn coerce_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| !v.is_nan()),
        Value::String(s) => parse_f64(s),
        _ => None,
    }
}

/// Render a number the way it is written to the output tables.
pub fn format_f64(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

pub fn format_opt(value: Option<f64>) -> Option<String> {
    value.map(format_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_f64_accepts_padded_numbers() {
        assert_eq!(parse_f64(" 2.5 "), Some(2.5));
        assert_eq!(parse_f64("1e3"), Some(1000.0));
    }

    #[test]
    fn test_parse_f64_rejects_blank_text_and_nan() {
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("   "), None);
        assert_eq!(parse_f64("Strong Buy"), None);
        assert_eq!(parse_f64("NaN"), None);
    }

    #[test]
    fn test_coerce_json() {
        assert_eq!(coerce_json(&json!(12)), Some(12.0));
        assert_eq!(coerce_json(&json!("7.25")), Some(7.25));
        assert_eq!(coerce_json(&json!(null)), None);
        assert_eq!(coerce_json(&json!({"raw": 1})), None);
    }

    #[test]
    fn test_format_f64() {
        assert_eq!(format_f64(100.0), "100.0");
        assert_eq!(format_f64(12.75), "12.75");
        assert_eq!(format_opt(None), None);
    }
}
