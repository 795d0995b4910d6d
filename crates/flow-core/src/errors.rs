//! Errores del motor.
//!
//! `EngineError` cubre la taxonomía completa: errores de definición, de
//! cadena (resolución e invocación, envueltos en `ChainError`) y de carga de
//! opciones. Los errores de dependencia no existen: limpiar un campo
//! dependiente es flujo normal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::invoker::InvokeError;

/// Error del resolvedor de expresiones `source.path`.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ResolveError {
    #[error("Invalid parameter mapping: \"{expression}\". Must be in the format \"source.value\"")]
    Malformed { expression: String },
    #[error("Invalid parameter source: \"{source_name}\". Must be \"payload\" or \"results\".")]
    InvalidSource { expression: String, source_name: String },
    #[error("Could not resolve value for mapping \"{expression}\" (missing segment \"{segment}\")")]
    UnresolvedPath { expression: String, segment: String },
    #[error("Mapping \"{expression}\" references result \"{result_key}\" which is not produced by an earlier action")]
    UnknownResult { expression: String, result_key: String },
}

/// Causa concreta de la falla de una acción de la cadena.
#[derive(Debug, Error, PartialEq, Clone, Serialize, Deserialize)]
pub enum ChainFailure {
    #[error(transparent)]
    Resolution(#[from] ResolveError),
    #[error(transparent)]
    Invocation(#[from] InvokeError),
}

/// Falla a nivel de cadena: identifica la acción que falló y envuelve su causa.
#[derive(Debug, Error, PartialEq, Clone, Serialize, Deserialize)]
#[error("Query \"{query_name}\" failed: {cause}")]
pub struct ChainError {
    pub action_index: usize,
    pub query_name: String,
    pub result_key: String,
    #[source]
    pub cause: ChainFailure,
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum EngineError {
    #[error("Flow \"{0}\" not found.")]
    FlowNotFound(String),
    #[error("Flow \"{0}\" has no steps.")]
    EmptyFlow(String),
    #[error("Current step \"{0}\" not found.")]
    StepNotFound(String),
    #[error("Step \"{step_id}\" is not the active step")]
    StepNotActive { step_id: String },
    #[error("Flow \"{requested}\" is not the active session flow")]
    SessionMismatch { requested: String },
    #[error("no active session")]
    NoActiveSession,
    #[error("advance already in flight (status loading)")]
    AdvanceInFlight,
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("Failed to load options for {field}: {source}")]
    OptionsLoad {
        field: String,
        #[source]
        source: InvokeError,
    },
    #[error("invalid flow definition: {0}")]
    InvalidDefinition(String),
}

impl EngineError {
    /// Los errores de definición son fatales para la sesión actual.
    pub fn is_definition_error(&self) -> bool {
        matches!(self,
                 Self::FlowNotFound(_)
                 | Self::EmptyFlow(_)
                 | Self::StepNotFound(_)
                 | Self::StepNotActive { .. }
                 | Self::SessionMismatch { .. }
                 | Self::NoActiveSession
                 | Self::InvalidDefinition(_))
    }
}
