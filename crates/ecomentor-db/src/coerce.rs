//! Tolerant readers for cells whose stored type has drifted over time
//! (numbers saved as text, `12.0` where an integer belongs, empty strings
//! standing in for "unset").

use chrono::NaiveDate;
use rusqlite::types::Value;

pub fn int(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Real(f) if f.is_finite() => Some(f.trunc() as i64),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

pub fn real(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(f) if f.is_finite() => Some(*f),
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        _ => None,
    }
}

/// Non-negative integer that fits `T`, otherwise `default`.
pub fn count<T: TryFrom<i64>>(value: &Value, default: T) -> T {
    int(value)
        .filter(|i| *i >= 0)
        .and_then(|i| T::try_from(i).ok())
        .unwrap_or(default)
}

/// A challenge id reference: only positive integers count, anything else
/// (`''`, `'s'`, `0`, NULL) means unset.
pub fn id_ref(value: &Value) -> Option<i64> {
    int(value).filter(|i| *i > 0)
}

pub fn date(value: &Value) -> Option<NaiveDate> {
    let raw = text(value)?;
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// Map a JSON scalar onto the cell value it would have been stored as.
/// Arrays and objects have no cell form and become NULL.
pub fn from_json(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Bool(b) => Value::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Value::Null
        }
    }
}
