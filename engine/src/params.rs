//! Lenient parsing of formula parameter blobs.
//!
//! Parameter blobs are operator-edited JSON; a missing, blank, or
//! unparseable blob must degrade the formula to its zero result instead
//! of failing the request. Numeric fields accept both JSON numbers and
//! strings.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Parse a blob, treating blank or malformed text as absent.
pub fn read_blob(blob: &str) -> Option<Value> {
    if blob.trim().is_empty() {
        return None;
    }
    serde_json::from_str(blob).ok()
}

/// Read a decimal field. Accepts numbers and numeric strings; blank
/// strings, wrong types, and unparseable text are treated as absent.
pub fn decimal_field(root: &Value, field: &str) -> Option<Decimal> {
    match root.get(field)? {
        Value::Number(number) => Decimal::from_str(&number.to_string()).ok(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            Decimal::from_str(trimmed).ok()
        }
        _ => None,
    }
}

/// Read the `scale` field controlling a contribution result's decimal
/// scale, falling back to `default` when absent or malformed.
pub fn scale_field(root: &Value, default: u32) -> u32 {
    match root.get("scale") {
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(default),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Clamp a percent parameter to `[0, 100]`; malformed operator config is
/// made safe rather than rejected.
pub fn clamp_percent(percent: Decimal) -> Decimal {
    percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_read_blob_rejects_blank_and_malformed() {
        assert!(read_blob("").is_none());
        assert!(read_blob("   ").is_none());
        assert!(read_blob("{not json").is_none());
        assert!(read_blob(r#"{"percent": 20}"#).is_some());
    }

    #[test]
    fn test_decimal_field_accepts_numbers_and_strings() {
        let root = read_blob(r#"{"a": 20.5, "b": "30.25", "c": " ", "d": true, "e": "x"}"#).unwrap();
        assert_eq!(decimal_field(&root, "a"), Some(dec!(20.5)));
        assert_eq!(decimal_field(&root, "b"), Some(dec!(30.25)));
        assert_eq!(decimal_field(&root, "c"), None);
        assert_eq!(decimal_field(&root, "d"), None);
        assert_eq!(decimal_field(&root, "e"), None);
        assert_eq!(decimal_field(&root, "missing"), None);
    }

    #[test]
    fn test_scale_field_default_and_override() {
        let root = read_blob(r#"{"scale": 4}"#).unwrap();
        assert_eq!(scale_field(&root, 2), 4);
        let root = read_blob(r#"{"percent": 1}"#).unwrap();
        assert_eq!(scale_field(&root, 2), 2);
        let root = read_blob(r#"{"scale": "3"}"#).unwrap();
        assert_eq!(scale_field(&root, 2), 3);
        let root = read_blob(r#"{"scale": -1}"#).unwrap();
        assert_eq!(scale_field(&root, 2), 2);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(dec!(-5)), dec!(0));
        assert_eq!(clamp_percent(dec!(150)), dec!(100));
        assert_eq!(clamp_percent(dec!(42.5)), dec!(42.5));
    }
}
