use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opción de un campo de selección (`{value, label}`).
///
/// `value` puede ser string o número según el catálogo que la produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: Value,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self { value: value.into(),
               label: label.into() }
    }

    /// Decodifica la respuesta opaca de una consulta de catálogo.
    ///
    /// Acepta un arreglo de objetos `{value, label}`; cualquier otra forma se
    /// reporta como error de deserialización.
    pub fn list_from_value(value: Value) -> Result<Vec<FieldOption>, serde_json::Error> {
        serde_json::from_value(value)
    }
}
