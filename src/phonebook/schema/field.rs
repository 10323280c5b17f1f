//! Field types and per-field coercion.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// The closed set of value types a field can declare.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Free text with optional length bounds, counted in characters after trimming.
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
        trim: bool,
    },

    /// An email address; always trimmed.
    Email,

    Integer {
        positive: bool,
    },

    Float {
        positive: bool,
    },
}

impl FieldType {
    pub const fn string() -> Self {
        FieldType::String {
            min_length: None,
            max_length: None,
            trim: false,
        }
    }

    /// Maps a declared type name to a field type.
    ///
    /// Names outside `integer`, `string`, `email` and `float` fall back to `string`.
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => FieldType::Integer { positive: false },
            "float" => FieldType::Float { positive: false },
            "email" => FieldType::Email,
            _ => FieldType::string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Email => "email",
            FieldType::Integer { .. } => "integer",
            FieldType::Float { .. } => "float",
        }
    }

    /// Coerces a non-null value into this type, or explains why it can't.
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        match self {
            FieldType::String {
                min_length,
                max_length,
                trim,
            } => {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err("value is not a valid string".to_string()),
                };
                let text = if *trim { raw.trim().to_string() } else { raw };
                let len = text.chars().count();
                if let Some(min) = min_length {
                    if len < *min {
                        return Err(format!("ensure this value has at least {} characters", min));
                    }
                }
                if let Some(max) = max_length {
                    if len > *max {
                        return Err(format!("ensure this value has at most {} characters", max));
                    }
                }
                Ok(Value::String(text))
            }
            FieldType::Email => {
                let Value::String(s) = value else {
                    return Err("value is not a valid email address".to_string());
                };
                let email = s.trim();
                if EMAIL_RE.is_match(email) {
                    Ok(Value::String(email.to_string()))
                } else {
                    Err("value is not a valid email address".to_string())
                }
            }
            FieldType::Integer { positive } => {
                let n = parse_integer(value).ok_or("value is not a valid integer")?;
                if *positive && n <= 0 {
                    return Err("ensure this value is greater than 0".to_string());
                }
                Ok(Value::from(n))
            }
            FieldType::Float { positive } => {
                let n = parse_float(value).ok_or("value is not a valid float")?;
                if *positive && n <= 0.0 {
                    return Err("ensure this value is greater than 0".to_string());
                }
                Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| "value is not a valid float".to_string())
            }
        }
    }
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_float(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// One named field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub required: bool,
    /// Already coerced to `ty`.
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bounded(min: Option<usize>, max: Option<usize>) -> FieldType {
        FieldType::String {
            min_length: min,
            max_length: max,
            trim: true,
        }
    }

    #[test]
    fn unknown_type_names_default_to_string() {
        assert_eq!(FieldType::from_type_name("date"), FieldType::string());
        assert_eq!(
            FieldType::from_type_name("integer"),
            FieldType::Integer { positive: false }
        );
        assert_eq!(FieldType::from_type_name("email"), FieldType::Email);
        assert_eq!(
            FieldType::from_type_name("float"),
            FieldType::Float { positive: false }
        );
    }

    #[test]
    fn string_is_trimmed_before_length_check() {
        let ty = bounded(Some(8), Some(15));
        assert_eq!(ty.coerce(&json!("  999999999  ")).unwrap(), json!("999999999"));
        assert!(ty.coerce(&json!("1234")).is_err());
        assert!(ty.coerce(&json!("1234567890123456")).is_err());
    }

    #[test]
    fn numbers_coerce_to_strings() {
        let ty = bounded(Some(8), Some(15));
        assert_eq!(ty.coerce(&json!(999999999)).unwrap(), json!("999999999"));
        assert!(ty.coerce(&json!(true)).is_err());
    }

    #[test]
    fn email_format_is_enforced() {
        assert_eq!(
            FieldType::Email.coerce(&json!(" adam@al.com ")).unwrap(),
            json!("adam@al.com")
        );
        assert!(FieldType::Email.coerce(&json!("adam@")).is_err());
        assert!(FieldType::Email.coerce(&json!("not an email")).is_err());
        assert!(FieldType::Email.coerce(&json!(12)).is_err());
    }

    #[test]
    fn integers_parse_from_strings_and_integral_floats() {
        let ty = FieldType::Integer { positive: false };
        assert_eq!(ty.coerce(&json!("33")).unwrap(), json!(33));
        assert_eq!(ty.coerce(&json!(33.0)).unwrap(), json!(33));
        assert!(ty.coerce(&json!(33.5)).is_err());
        assert!(ty.coerce(&json!("abc")).is_err());
    }

    #[test]
    fn positivity_is_checked_when_declared() {
        let ty = FieldType::Integer { positive: true };
        assert!(ty.coerce(&json!(0)).is_err());
        assert!(ty.coerce(&json!(-3)).is_err());
        assert_eq!(ty.coerce(&json!(3)).unwrap(), json!(3));

        let ty = FieldType::Float { positive: true };
        assert!(ty.coerce(&json!(-0.5)).is_err());
        assert_eq!(ty.coerce(&json!("1.5")).unwrap(), json!(1.5));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let ty = FieldType::Float { positive: false };
        assert!(ty.coerce(&json!("NaN")).is_err());
        assert!(ty.coerce(&json!("inf")).is_err());
    }
}
