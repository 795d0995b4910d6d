use serde::Serialize;
use serde_json::Value;

use crate::model::FieldOption;

/// Fase de un campo respecto a sus opciones. `Disabled` y `Loading` son
/// variantes distintas: un campo nunca está en ambas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "kebab-case")]
pub enum FieldPhase {
    Idle,
    /// Carga en vuelo; sólo se acepta la respuesta con la misma generación.
    Loading { generation: u64 },
    /// Dependencia vacía.
    Disabled,
    /// La última carga falló; el error es local al campo.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    pub value: Value,
    pub options: Vec<FieldOption>,
    pub phase: FieldPhase,
}

impl FieldState {
    pub(crate) fn new(value: Value, options: Vec<FieldOption>, phase: FieldPhase) -> Self {
        Self { value,
               options,
               phase }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, FieldPhase::Loading { .. })
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.phase, FieldPhase::Disabled)
    }
}

/// Carga de opciones pendiente para un campo. Se construye de forma síncrona
/// al cambiar un valor y se resuelve después con `OptionsLoader`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsRequest {
    pub field_key: String,
    pub query_name: String,
    pub parent_field: Option<String>,
    pub dependency_value: Option<Value>,
    pub generation: u64,
}
