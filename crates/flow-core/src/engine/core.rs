//! Core FlowEngine implementation

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::cascade::CascadingFieldResolver;
use crate::chain::{ChainObserver, QueryChainExecutor};
use crate::config::EngineConfig;
use crate::constants::{ENGINE_VERSION, MSG_FLOW_NOT_FOUND_OR_EMPTY};
use crate::engine::{EngineBuilderInit, OptionsLoader, SessionCtx};
use crate::errors::EngineError;
use crate::event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
use crate::invoker::QueryInvoker;
use crate::model::{merge_payload, FlowDefinition, Params, Payload, QueryChainAction};
use crate::repo::{FlowRepository, InMemoryFlowRepository};
use crate::resolver::ParameterResolver;
use crate::state::{ExecutionState, FlowStatus};

/// Datos que la UI envía al completar el step activo.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceRequest {
    pub flow_id: String,
    pub current_step_id: String,
    pub payload: Payload,
}

impl AdvanceRequest {
    pub fn new(flow_id: impl Into<String>, current_step_id: impl Into<String>, payload: Payload) -> Self {
        Self { flow_id: flow_id.into(),
               current_step_id: current_step_id.into(),
               payload }
    }
}

/// Motor de ejecución de flujos.
///
/// Dueño único del `ExecutionState` de la sesión: sólo `start_flow`,
/// `advance_flow` y `regress_flow` lo mutan, y cada transición se publica en
/// un canal `watch` y se registra en el `EventStore`. `advance_flow` toma
/// `&mut self`, así que no puede haber dos avances en vuelo para la misma
/// sesión.
pub struct FlowEngine<E, R>
    where E: EventStore,
          R: FlowRepository
{
    event_store: E,
    repository: R,
    invoker: Arc<dyn QueryInvoker>,
    config: EngineConfig,
    state: ExecutionState,
    publisher: watch::Sender<ExecutionState>,
    session_id: Uuid,
    /// Snapshot de la definición tomado en `start_flow`.
    definition: Option<Arc<FlowDefinition>>,
}

impl<E, R> FlowEngine<E, R>
    where E: EventStore,
          R: FlowRepository
{
    /// Crea un nuevo builder para configurar el engine
    #[inline]
    pub fn builder(event_store: E, repository: R) -> EngineBuilderInit<E, R> {
        EngineBuilderInit { event_store,
                            repository }
    }

    /// Crea un nuevo motor con los stores proporcionados
    pub fn new_with_stores(event_store: E, repository: R, invoker: Arc<dyn QueryInvoker>, config: EngineConfig) -> Self {
        let state = ExecutionState::initial();
        let (publisher, _) = watch::channel(state.clone());
        Self { event_store,
               repository,
               invoker,
               config,
               state,
               publisher,
               session_id: Uuid::new_v4(),
               definition: None }
    }

    /// Estado vigente (sólo lectura).
    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Suscripción a los snapshots publicados tras cada transición.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.publisher.subscribe()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Definición de la sesión activa.
    pub fn definition(&self) -> Option<&FlowDefinition> {
        self.definition.as_deref()
    }

    /// Eventos de la sesión actual.
    pub fn events(&self) -> Vec<FlowEvent> {
        self.event_store.list(self.session_id)
    }

    /// Vacío para sesiones anteriores al último `start_flow`.
    pub fn events_for(&self, session_id: Uuid) -> Vec<FlowEvent> {
        self.event_store.list(session_id)
    }

    /// Traza compacta de la sesión actual (una letra por evento).
    pub fn event_variants(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.kind.code()).collect()
    }

    /// Handle para cargar opciones fuera del engine.
    pub fn options_loader(&self) -> OptionsLoader {
        OptionsLoader::new(self.invoker.clone())
    }

    /// Resolvedor de cascada para el step activo, pre-llenado con el payload
    /// acumulado. `None` si la sesión no está en `ready`.
    pub fn cascade_for_current_step(&self) -> Option<CascadingFieldResolver> {
        let step = self.state.current_step()?;
        Some(CascadingFieldResolver::for_step(step, &self.state.completed_steps_payload, self.options_loader()))
    }

    /// Contexto ergonómico sobre la sesión activa.
    pub fn session(&mut self) -> SessionCtx<'_, E, R> {
        SessionCtx::new(self)
    }

    /// Inicia (o reinicia) una sesión sobre `flow_id`.
    ///
    /// Resetea todo el estado de sesión. Termina en `ready@0` con payload
    /// vacío, o en `error` si el flujo no existe o no tiene steps. Sólo se
    /// retiene el stream de eventos de la sesión en curso.
    pub fn start_flow(&mut self, flow_id: &str) -> Result<(), EngineError> {
        self.event_store.discard(self.session_id);
        self.session_id = Uuid::new_v4();
        self.definition = None;

        let definition = match self.repository.find(flow_id) {
            Some(d) if !d.is_empty() => d,
            found => {
                let err = match found {
                    Some(_) => EngineError::EmptyFlow(flow_id.to_string()),
                    None => EngineError::FlowNotFound(flow_id.to_string()),
                };
                warn!("start_flow rejected flow_id={flow_id}: {err}");
                self.event_store.append_kind(self.session_id,
                                             FlowEventKind::SessionRejected { flow_id: flow_id.to_string(),
                                                                              reason: err.to_string() });
                self.state = ExecutionState { flow_id: Some(flow_id.to_string()),
                                              status: FlowStatus::Error { message: MSG_FLOW_NOT_FOUND_OR_EMPTY.to_string() },
                                              completed_steps_payload: Payload::new() };
                self.publish();
                return Err(err);
            }
        };

        let first = definition.steps[0].clone();
        self.event_store.append_kind(self.session_id,
                                     FlowEventKind::SessionStarted { flow_id: flow_id.to_string(),
                                                                     step_count: definition.len(),
                                                                     engine_version: ENGINE_VERSION.to_string() });
        info!("Flow session started flow_id={flow_id} session={} steps={}", self.session_id, definition.len());
        self.state = ExecutionState { flow_id: Some(flow_id.to_string()),
                                      status: FlowStatus::Ready { current_step: first,
                                                                  current_step_index: 0 },
                                      completed_steps_payload: Payload::new() };
        self.definition = Some(definition);
        self.publish();
        Ok(())
    }

    /// Envía los datos del step activo.
    ///
    /// Sin cadena: `ready@index+1` o `completed`. Con cadena: `loading` y
    /// luego exactamente uno de `final-result` o `error`. Los errores de
    /// definición dejan la sesión en `error` conservando el payload.
    ///
    /// Si el future se descarta mientras la cadena corre, la sesión queda en
    /// `loading` y todo avance posterior devuelve `AdvanceInFlight`; hay que
    /// llamar a `start_flow` para recuperarla.
    pub async fn advance_flow(&mut self, request: AdvanceRequest) -> Result<(), EngineError> {
        if self.state.is_loading() && self.definition.is_some() {
            warn!("advance_flow ignored: previous advance still in flight");
            return Err(EngineError::AdvanceInFlight);
        }

        let definition = match self.definition.clone() {
            Some(d) => d,
            None => return Err(self.fail_definition(EngineError::NoActiveSession)),
        };
        if definition.id != request.flow_id {
            return Err(self.fail_definition(EngineError::SessionMismatch { requested: request.flow_id }));
        }
        let index = match definition.step_index(&request.current_step_id) {
            Some(i) => i,
            None => return Err(self.fail_definition(EngineError::StepNotFound(request.current_step_id))),
        };
        if self.state.current_step_index() != Some(index) {
            return Err(self.fail_definition(EngineError::StepNotActive { step_id: request.current_step_id }));
        }

        self.state.completed_steps_payload = merge_payload(&self.state.completed_steps_payload, &request.payload);
        let step = &definition.steps[index];

        if step.has_query_chain() {
            return self.run_chain(&definition, index).await;
        }

        match definition.step_at(index + 1) {
            Some(next) => {
                debug!("advance flow_id={} {} -> {}", definition.id, step.id, next.id);
                self.event_store.append_kind(self.session_id,
                                             FlowEventKind::StepAdvanced { step_id: step.id.clone(),
                                                                           from_index: index,
                                                                           to_index: index + 1 });
                self.state.status = FlowStatus::Ready { current_step: next.clone(),
                                                       current_step_index: index + 1 };
            }
            None => {
                info!("Flow completed flow_id={} session={}", definition.id, self.session_id);
                self.event_store
                    .append_kind(self.session_id, FlowEventKind::FlowCompleted { flow_id: definition.id.clone() });
                self.state.status = FlowStatus::Completed;
            }
        }
        self.publish();
        Ok(())
    }

    /// Retrocede un step. No-op (sin publicar) fuera de `ready`, en el step 0
    /// o si `flow_id` no es el de la sesión. Nunca re-ejecuta cadenas.
    pub fn regress_flow(&mut self, flow_id: &str) -> bool {
        let Some(definition) = self.definition.as_ref() else {
            return false;
        };
        let index = match self.state.current_step_index() {
            Some(i) if i > 0 && definition.id == flow_id => i,
            _ => {
                debug!("regress_flow no-op flow_id={flow_id} status={}", self.state.status_name());
                return false;
            }
        };
        let Some(previous) = definition.step_at(index - 1).cloned() else {
            return false;
        };
        self.event_store.append_kind(self.session_id,
                                     FlowEventKind::StepRegressed { from_index: index,
                                                                    to_index: index - 1 });
        self.state.status = FlowStatus::Ready { current_step: previous,
                                               current_step_index: index - 1 };
        self.publish();
        true
    }

    async fn run_chain(&mut self, definition: &FlowDefinition, index: usize) -> Result<(), EngineError> {
        let step = &definition.steps[index];
        self.state.status = FlowStatus::Loading;
        self.publish();
        self.event_store.append_kind(self.session_id,
                                     FlowEventKind::ChainStarted { step_id: step.id.clone(),
                                                                   actions: step.query_chain.len() });
        info!("Executing query chain step={} actions={}", step.id, step.query_chain.len());

        let invoker = self.invoker.clone();
        let executor = QueryChainExecutor::new(invoker.as_ref(), ParameterResolver::new(self.config.param_resolution));
        let mut recorder = EventRecorder { store: &mut self.event_store,
                                           session_id: self.session_id };
        let outcome = executor.execute_observed(&step.query_chain, &self.state.completed_steps_payload, &mut recorder)
                              .await;

        match outcome {
            Ok(results) => {
                let result_keys: Vec<String> = results.keys().cloned().collect();
                self.event_store.append_kind(self.session_id,
                                             FlowEventKind::ChainSucceeded { step_id: step.id.clone(),
                                                                             result_keys });
                info!("Query chain succeeded step={}", step.id);
                self.state.status = FlowStatus::FinalResult { final_query_result: results };
                self.publish();
                Ok(())
            }
            Err(err) => {
                error!("Query chain failed step={}: {err}", step.id);
                self.event_store.append_kind(self.session_id,
                                             FlowEventKind::ChainFailed { step_id: step.id.clone(),
                                                                          action_index: err.action_index,
                                                                          query_name: err.query_name.clone(),
                                                                          error: err.to_string() });
                self.state.status = FlowStatus::Error { message: err.to_string() };
                self.publish();
                Err(EngineError::Chain(err))
            }
        }
    }

    /// Lleva la sesión a `error` conservando el payload acumulado.
    fn fail_definition(&mut self, err: EngineError) -> EngineError {
        error!("advance_flow definition error: {err}");
        self.event_store
            .append_kind(self.session_id, FlowEventKind::SessionFailed { message: err.to_string() });
        self.state.status = FlowStatus::Error { message: err.to_string() };
        self.publish();
        err
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

impl FlowEngine<InMemoryEventStore, InMemoryFlowRepository> {
    /// Engine con stores en memoria y configuración tomada del entorno.
    pub fn in_memory(repository: InMemoryFlowRepository, invoker: Arc<dyn QueryInvoker>) -> Self {
        Self::new_with_stores(InMemoryEventStore::default(), repository, invoker, EngineConfig::from_env())
    }
}

impl<E, R> std::fmt::Debug for FlowEngine<E, R>
    where E: EventStore,
          R: FlowRepository
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine")
         .field("session_id", &self.session_id)
         .field("state", &self.state)
         .field("config", &self.config)
         .finish_non_exhaustive()
    }
}

/// Traduce el progreso de la cadena a eventos de sesión.
struct EventRecorder<'a, E: EventStore> {
    store: &'a mut E,
    session_id: Uuid,
}

impl<E: EventStore> ChainObserver for EventRecorder<'_, E> {
    fn action_started(&mut self, index: usize, action: &QueryChainAction, params: &Params) {
        debug!("session={} chain action #{index} {} params={}",
               self.session_id,
               action.query_name,
               Value::Object(params.clone()));
    }

    fn action_finished(&mut self, index: usize, action: &QueryChainAction, _result: &Value) {
        self.store.append_kind(self.session_id,
                               FlowEventKind::ChainActionFinished { action_index: index,
                                                                    query_name: action.query_name.clone(),
                                                                    result_key: action.result_key.clone() });
    }
}
