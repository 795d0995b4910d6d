//! Tipos de evento de sesión y estructura `FlowEvent`.
//!
//! Rol en el flujo:
//! - Cada transición del `FlowEngine` emite un evento a un `EventStore`
//!   append-only, con un stream por sesión.
//! - La bitácora es sólo de observación: el estado vigente vive en
//!   `ExecutionState` y nunca se reconstruye desde aquí.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlowEventKind {
    /// Sesión iniciada en el step 0. Invariante: primer evento de la sesión.
    SessionStarted {
        flow_id: String,
        step_count: usize,
        engine_version: String,
    },
    /// `start_flow` sobre un flujo inexistente o vacío.
    SessionRejected { flow_id: String, reason: String },
    StepAdvanced {
        step_id: String,
        from_index: usize,
        to_index: usize,
    },
    StepRegressed { from_index: usize, to_index: usize },
    ChainStarted { step_id: String, actions: usize },
    ChainActionFinished {
        action_index: usize,
        query_name: String,
        result_key: String,
    },
    ChainSucceeded { step_id: String, result_keys: Vec<String> },
    ChainFailed {
        step_id: String,
        action_index: usize,
        query_name: String,
        error: String,
    },
    /// Se envió el último step de formulario puro.
    FlowCompleted { flow_id: String },
    /// Error fatal de definición para la sesión.
    SessionFailed { message: String },
}

impl FlowEventKind {
    /// Letra compacta para trazas en tests y logs.
    pub fn code(&self) -> &'static str {
        match self {
            FlowEventKind::SessionStarted { .. } => "I",
            FlowEventKind::SessionRejected { .. } => "J",
            FlowEventKind::StepAdvanced { .. } => "A",
            FlowEventKind::StepRegressed { .. } => "R",
            FlowEventKind::ChainStarted { .. } => "Q",
            FlowEventKind::ChainActionFinished { .. } => "F",
            FlowEventKind::ChainSucceeded { .. } => "S",
            FlowEventKind::ChainFailed { .. } => "X",
            FlowEventKind::FlowCompleted { .. } => "C",
            FlowEventKind::SessionFailed { .. } => "E",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub session_id: Uuid,
    pub kind: FlowEventKind,
    pub ts: DateTime<Utc>,
}
