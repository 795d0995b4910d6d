use serde::{Deserialize, Serialize};

use crate::model::{FlowStep, Payload, ResultsContext};

/// Estado de la sesión. Exactamente una variante vigente a la vez.
///
/// Transiciones válidas:
/// - `Loading` -> `Ready` | `Error` (start)
/// - `Ready` -> `Ready` (advance sin cadena / regress)
/// - `Ready` -> `Completed` (último step sin cadena)
/// - `Ready` -> `Loading` -> `FinalResult` | `Error` (step con cadena)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FlowStatus {
    Loading,
    #[serde(rename_all = "camelCase")]
    Ready {
        current_step: FlowStep,
        current_step_index: usize,
    },
    Completed,
    #[serde(rename_all = "camelCase")]
    FinalResult { final_query_result: ResultsContext },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    #[serde(flatten)]
    pub status: FlowStatus,
    /// Payload acumulado de los steps enviados; se conserva en `Error` para
    /// no perder la entrada del usuario.
    #[serde(default)]
    pub completed_steps_payload: Payload,
}

impl ExecutionState {
    pub fn initial() -> Self {
        Self { flow_id: None,
               status: FlowStatus::Loading,
               completed_steps_payload: Payload::new() }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, FlowStatus::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, FlowStatus::Ready { .. })
    }

    /// `Completed`, `FinalResult` y `Error` cierran la sesión actual.
    pub fn is_terminal(&self) -> bool {
        match self.status {
            FlowStatus::Completed | FlowStatus::FinalResult { .. } | FlowStatus::Error { .. } => true,
            FlowStatus::Loading | FlowStatus::Ready { .. } => false,
        }
    }

    /// Índice vigente; sólo definido en `Ready`.
    pub fn current_step_index(&self) -> Option<usize> {
        match &self.status {
            FlowStatus::Ready { current_step_index, .. } => Some(*current_step_index),
            _ => None,
        }
    }

    pub fn current_step(&self) -> Option<&FlowStep> {
        match &self.status {
            FlowStatus::Ready { current_step, .. } => Some(current_step),
            _ => None,
        }
    }

    pub fn final_result(&self) -> Option<&ResultsContext> {
        match &self.status {
            FlowStatus::FinalResult { final_query_result } => Some(final_query_result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            FlowStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Nombre del estado tal como lo ve la UI.
    pub fn status_name(&self) -> &'static str {
        match self.status {
            FlowStatus::Loading => "loading",
            FlowStatus::Ready { .. } => "ready",
            FlowStatus::Completed => "completed",
            FlowStatus::FinalResult { .. } => "final-result",
            FlowStatus::Error { .. } => "error",
        }
    }
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::initial()
    }
}
