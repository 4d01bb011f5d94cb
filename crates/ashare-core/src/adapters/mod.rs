mod eastmoney;
mod static_catalog;
mod tushare;

pub use eastmoney::EastmoneyAdapter;
pub use static_catalog::StaticCatalog;
pub use tushare::TushareAdapter;

use serde_json::Value;

use crate::{SourceError, ValidationError};

/// Strict numeric coercion for provider cells. A cell that is neither a
/// number nor a numeric string fails the whole operation; suspended stocks
/// show up as `"-"` in eastmoney frames and are rejected here.
pub(crate) fn num_f64(value: &Value, field: &'static str) -> Result<f64, SourceError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(parsed) if parsed.is_finite() => Ok(parsed),
        Some(_) => Err(coercion_error(ValidationError::NonFiniteValue { field })),
        None => Err(coercion_error(ValidationError::NonNumericField {
            field,
            value: cell_repr(value),
        })),
    }
}

pub(crate) fn num_i64(value: &Value, field: &'static str) -> Result<i64, SourceError> {
    if let Value::Number(number) = value {
        if let Some(parsed) = number.as_i64() {
            return Ok(parsed);
        }
    }

    // Providers ship integer columns as floats or strings interchangeably.
    num_f64(value, field).map(|parsed| parsed as i64)
}

pub(crate) fn opt_str(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(raw.clone()),
        _ => None,
    }
}

fn coercion_error(error: ValidationError) -> SourceError {
    SourceError::internal(error.to_string())
}

fn cell_repr(value: &Value) -> String {
    match value {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_numbers_and_numeric_strings() {
        assert_eq!(num_f64(&json!(10.5), "price").expect("number"), 10.5);
        assert_eq!(num_f64(&json!("10.5"), "price").expect("string"), 10.5);
        assert_eq!(num_i64(&json!(42), "volume").expect("int"), 42);
        assert_eq!(num_i64(&json!("42"), "volume").expect("string int"), 42);
    }

    #[test]
    fn rejects_suspended_placeholder_cells() {
        let error = num_f64(&json!("-"), "price").expect_err("dash is not numeric");
        assert!(error.message().contains("price"));
    }
}
