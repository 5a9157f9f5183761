//! Scalar cell values

use serde::{Deserialize, Serialize};

/// A single value stored under a record column.
///
/// The backend sends loosely typed JSON; anything that is not null, a
/// boolean, a number or a string is kept verbatim in `Json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON null
    Null,
    /// Boolean
    Bool(bool),
    /// Any JSON number
    Number(f64),
    /// UTF-8 string
    Text(String),
    /// Nested arrays or objects
    Json(serde_json::Value),
}

impl Scalar {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(v) => Some(*v),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Whether the value counts as "set" when building fallback keys.
    ///
    /// Empty strings, zero, `false` and null are all unset.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(v) => *v,
            Scalar::Number(v) => *v != 0.0 && !v.is_nan(),
            Scalar::Text(s) => !s.is_empty(),
            Scalar::Json(_) => true,
        }
    }

    /// Stringify for display and comparison. Null becomes an empty string.
    pub fn display(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            _ => self.to_string(),
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Number(v) => f.write_str(&js_number_string(*v)),
            Scalar::Text(v) => write!(f, "{}", v),
            Scalar::Json(serde_json::Value::Array(items)) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect();
                write!(f, "{}", parts.join(","))
            }
            Scalar::Json(serde_json::Value::Object(_)) => write!(f, "[object Object]"),
            Scalar::Json(v) => write!(f, "{}", v),
        }
    }
}

/// Largest decimal exponent printed without `e` notation
const MAX_PLAIN_EXPONENT: i32 = 21;
/// Smallest decimal exponent printed without `e` notation
const MIN_PLAIN_EXPONENT: i32 = -6;

/// Number text as an ECMAScript host prints it: shortest round-trip digits,
/// plain notation for exponents in `(-7, 21)`, `-0` shown as `0`.
pub fn js_number_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-trip mantissa, e.g. `1.5e-7`
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= MAX_PLAIN_EXPONENT {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= MAX_PLAIN_EXPONENT {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{int_part}.{frac_part}")
    } else if MIN_PLAIN_EXPONENT < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{}", exponent.abs())
        } else {
            format!("{first}.{rest}e{sign}{}", exponent.abs())
        }
    };

    if value < 0.0 { format!("-{body}") } else { body }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_deserialize_untagged() {
        let values: Vec<Scalar> =
            serde_json::from_str(r#"[null, true, 1.5, "x", [1, 2]]"#).unwrap();
        assert_eq!(values[0], Scalar::Null);
        assert_eq!(values[1], Scalar::Bool(true));
        assert_eq!(values[2], Scalar::Number(1.5));
        assert_eq!(values[3], Scalar::Text("x".into()));
        assert!(matches!(values[4], Scalar::Json(_)));
    }

    #[test]
    fn test_display_matches_host_stringification() {
        assert_eq!(Scalar::Null.display(), "");
        assert_eq!(Scalar::Number(3.0).display(), "3");
        assert_eq!(Scalar::Number(0.25).display(), "0.25");
        assert_eq!(Scalar::Bool(false).display(), "false");
        assert_eq!(
            Scalar::Json(serde_json::json!(["a", 1])).display(),
            "a,1"
        );
    }

    #[rstest]
    #[case(1e21, "1e+21")]
    #[case(1e20, "100000000000000000000")]
    #[case(1.5e-7, "1.5e-7")]
    #[case(1e-7, "1e-7")]
    #[case(0.000001, "0.000001")]
    #[case(-0.0, "0")]
    #[case(-2.5, "-2.5")]
    #[case(123.456, "123.456")]
    #[case(1.2345e25, "1.2345e+25")]
    #[case(0.1 + 0.2, "0.30000000000000004")]
    fn test_number_display_matches_js(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(Scalar::Number(value).display(), expected);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Scalar::Number(0.0).is_truthy());
        assert!(!Scalar::Text(String::new()).is_truthy());
        assert!(Scalar::Text("0".into()).is_truthy());
        assert!(Scalar::Number(-1.0).is_truthy());
    }
}
