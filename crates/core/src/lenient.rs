//! Tolerant field deserializers for model-generated JSON.
//!
//! The model is told to use strings, numbers and `null`, but it regularly
//! returns `"4.5"` for a rating, `"1,204"` for a review count or an array of
//! lines for opening hours. These helpers accept the common variants and map
//! anything unusable to `None` instead of failing the whole batch.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// String field: trims, treats empty as missing, stringifies scalars and
/// joins arrays of scalars with "; ".
pub(crate) fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_string))
}

/// Required-in-spirit string field: missing or null becomes "".
pub(crate) fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string(deserializer)?.unwrap_or_default())
}

/// Floating point field: numbers or plain numeric strings like "4.5".
pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// Non-negative count: numbers, "1,204", "1204 reviews".
pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_count))
}

fn value_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_string)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn value_to_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let cleaned = s.trim().replace([',', '_'], "");
            let token = cleaned.split_whitespace().next()?;
            token
                .parse::<u64>()
                .ok()
                .or_else(|| token.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_variants() {
        assert_eq!(value_to_string(&json!("  Cafe  ")), Some("Cafe".into()));
        assert_eq!(value_to_string(&json!("")), None);
        assert_eq!(value_to_string(&json!(null)), None);
        assert_eq!(value_to_string(&json!(5551234)), Some("5551234".into()));
        assert_eq!(
            value_to_string(&json!(["Mon 9-5", "Tue 9-5"])),
            Some("Mon 9-5; Tue 9-5".into())
        );
    }

    #[test]
    fn test_number_variants() {
        assert_eq!(value_to_f64(&json!(4.5)), Some(4.5));
        assert_eq!(value_to_f64(&json!("4.2")), Some(4.2));
        assert_eq!(value_to_f64(&json!("n/a")), None);
        assert_eq!(value_to_f64(&json!(true)), None);
    }

    #[test]
    fn test_count_variants() {
        assert_eq!(value_to_count(&json!(120)), Some(120));
        assert_eq!(value_to_count(&json!(120.0)), Some(120));
        assert_eq!(value_to_count(&json!("1,204")), Some(1204));
        assert_eq!(value_to_count(&json!("87 reviews")), Some(87));
        assert_eq!(value_to_count(&json!(-3)), None);
        assert_eq!(value_to_count(&json!("many")), None);
    }
}
