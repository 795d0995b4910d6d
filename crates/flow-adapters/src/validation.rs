//! Validación de parámetros contra la declaración de la consulta.
//!
//! Se recorre en orden de declaración y se reporta la primera violación:
//! requerido ausente, número no numérico o fecha no parseable.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use flow_core::model::Params;
use flow_core::{InvokeError, ParamType};
use serde_json::Value;

use crate::catalog::CustomQuery;

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

pub fn validate_params(query: &CustomQuery, params: &Params) -> Result<(), InvokeError> {
    for p in &query.parameters {
        let value = params.get(&p.key);
        let Some(value) = value.filter(|v| is_present(v)) else {
            if p.required {
                return Err(InvokeError::MissingParameter { query: query.name.clone(),
                                                           param: p.key.clone() });
            }
            continue;
        };
        let ok = match p.param_type {
            ParamType::String => true,
            ParamType::Number => is_numeric(value),
            ParamType::Date => is_date(value),
        };
        if !ok {
            return Err(InvokeError::TypeMismatch { param: p.key.clone(),
                                                   expected: p.param_type,
                                                   received: display_value(value) });
        }
    }
    Ok(())
}

/// `null` y `""` cuentan como ausentes.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) | Value::Bool(_) => true,
        Value::String(s) => {
            let t = s.trim();
            t.is_empty() || t.parse::<f64>().is_ok_and(|n| !n.is_nan())
        }
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Acepta RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` (el formato de
/// `datetime-local`) y marcas de tiempo numéricas.
pub fn is_date(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => {
            let t = s.trim();
            DateTime::parse_from_rfc3339(t).is_ok()
            || NaiveDate::parse_from_str(t, "%Y-%m-%d").is_ok()
            || NAIVE_DATETIME_FORMATS.iter()
                                     .any(|f| NaiveDateTime::parse_from_str(t, f).is_ok())
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => false,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
