//! Session context implementation

use serde_json::Value;

use crate::engine::{AdvanceRequest, FlowEngine};
use crate::errors::EngineError;
use crate::event::EventStore;
use crate::model::Payload;
use crate::repo::FlowRepository;
use crate::state::ExecutionState;

/// Contexto de ejecución sobre la sesión activa.
///
/// Envía el step vigente sin que el llamador repita `flow_id` ni `step_id`.
pub struct SessionCtx<'a, E: EventStore, R: FlowRepository> {
    pub engine: &'a mut FlowEngine<E, R>,
}

impl<'a, E: EventStore, R: FlowRepository> SessionCtx<'a, E, R> {
    #[inline]
    pub fn new(engine: &'a mut FlowEngine<E, R>) -> Self {
        Self { engine }
    }

    #[inline]
    pub fn state(&self) -> &ExecutionState {
        self.engine.state()
    }

    /// Envía `payload` para el step activo.
    pub async fn submit(&mut self, payload: Payload) -> Result<(), EngineError> {
        let state = self.engine.state();
        let flow_id = state.flow_id.clone().ok_or(EngineError::NoActiveSession)?;
        let step_id = state.current_step()
                           .map(|s| s.id.clone())
                           .ok_or_else(|| EngineError::StepNotActive { step_id: String::new() })?;
        self.engine.advance_flow(AdvanceRequest::new(flow_id, step_id, payload)).await
    }

    /// Variante de `submit` que acepta un objeto JSON; cualquier otro valor
    /// se envía como payload vacío.
    pub async fn submit_json(&mut self, payload: Value) -> Result<(), EngineError> {
        let payload = match payload {
            Value::Object(map) => map,
            _ => Payload::new(),
        };
        self.submit(payload).await
    }

    /// Envía steps sucesivos hasta agotar `payloads` o salir de `ready`.
    pub async fn submit_all<I>(&mut self, payloads: I) -> Result<(), EngineError>
        where I: IntoIterator<Item = Payload>
    {
        for payload in payloads {
            if !self.engine.state().is_ready() {
                break;
            }
            self.submit(payload).await?;
        }
        Ok(())
    }

    /// Retrocede un step en la sesión activa.
    #[inline]
    pub fn back(&mut self) -> bool {
        match self.engine.state().flow_id.clone() {
            Some(flow_id) => self.engine.regress_flow(&flow_id),
            None => false,
        }
    }
}
