//! Contrato del Query Invoker (colaborador externo).
//!
//! El motor sólo conoce `invoke(query_name, params)`. La validación de
//! parámetros requeridos y tipos es responsabilidad de la implementación; el
//! motor trata cualquier rechazo como falla opaca de la acción.
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::Params;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum InvokeError {
    #[error("Query \"{0}\" not found.")]
    UnknownQuery(String),
    #[error("Missing required parameter: \"{param}\" for query \"{query}\".")]
    MissingParameter { query: String, param: String },
    #[error("Type mismatch for parameter \"{param}\". Expected {expected}, but received \"{received}\".")]
    TypeMismatch {
        param: String,
        expected: ParamType,
        received: String,
    },
    #[error("{0}")]
    Backend(String),
}

/// Tipos de parámetro que un backend puede declarar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Date,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => f.write_str("a string"),
            ParamType::Number => f.write_str("a number"),
            ParamType::Date => f.write_str("a valid date format"),
        }
    }
}

/// Parámetro declarado por una consulta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
}

impl QueryParameter {
    pub fn new(key: impl Into<String>, param_type: ParamType, required: bool) -> Self {
        let key = key.into();
        Self { label: key.clone(),
               key,
               param_type,
               required }
    }
}

#[async_trait]
pub trait QueryInvoker: Send + Sync {
    /// Ejecuta la consulta `query_name` con parámetros ya resueltos.
    async fn invoke(&self, query_name: &str, params: &Params) -> Result<Value, InvokeError>;

    /// Parámetros declarados por la consulta, si el backend los publica.
    /// Se usa para ligar el valor de dependencia en la carga de opciones.
    fn declared_parameters(&self, _query_name: &str) -> Option<Vec<QueryParameter>> {
        None
    }
}
