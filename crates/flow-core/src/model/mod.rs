//! Modelo de datos de flujos: definición inmutable, campos de formulario,
//! acciones de cadena y contextos de ejecución (payload / resultados).

mod context;
mod definition;
mod option;

pub use context::{is_blank, merge_payload, Params, Payload, ResultsContext};
pub use definition::{FieldType, FlowDefinition, FlowGroup, FlowStep, FormField, QueryChainAction};
pub use option::FieldOption;
