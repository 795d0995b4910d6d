use std::collections::{HashSet, VecDeque};

use futures::future::join_all;
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;

use super::field::{FieldPhase, FieldState, OptionsRequest};
use crate::engine::OptionsLoader;
use crate::errors::EngineError;
use crate::invoker::InvokeError;
use crate::model::{is_blank, FieldOption, FlowStep, FormField, Payload};

/// Estado de los campos de un step y protocolo de cascada entre ellos.
///
/// `set_value` es síncrono: aplica la invalidación y devuelve las cargas a
/// emitir, de modo que la limpieza siempre precede a la nueva petición.
/// `apply_options` descarta respuestas de generaciones ya invalidadas.
#[derive(Debug)]
pub struct CascadingFieldResolver {
    step: FlowStep,
    fields: IndexMap<String, FieldState>,
    loader: OptionsLoader,
    generation: u64,
}

impl CascadingFieldResolver {
    /// Prepara el step con valores pre-llenados desde `prefill` (payload
    /// acumulado al re-entrar en un step).
    pub fn for_step(step: &FlowStep, prefill: &Payload, loader: OptionsLoader) -> Self {
        let mut fields = IndexMap::with_capacity(step.fields.len());
        for f in &step.fields {
            let value = prefill.get(&f.key).cloned().unwrap_or(Value::Null);
            let parent_blank = f.dependency_key.as_ref().map(|dep| is_blank(prefill.get(dep)));
            let state = match parent_blank {
                Some(true) => FieldState::new(value, vec![], FieldPhase::Disabled),
                _ => FieldState::new(value, static_options(f), FieldPhase::Idle),
            };
            fields.insert(f.key.clone(), state);
        }
        Self { step: step.clone(),
               fields,
               loader,
               generation: 0 }
    }

    pub fn step(&self) -> &FlowStep {
        &self.step
    }

    pub fn field(&self, key: &str) -> Option<&FieldState> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldState)> {
        self.fields.iter()
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).map(|s| &s.value)
    }

    pub fn options(&self, key: &str) -> &[FieldOption] {
        self.fields.get(key).map(|s| s.options.as_slice()).unwrap_or(&[])
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(FieldState::is_loading)
    }

    pub fn is_disabled(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(FieldState::is_disabled)
    }

    /// Valores actuales de todos los campos (incluidos los deshabilitados),
    /// listos para `advance_flow`.
    pub fn values(&self) -> Payload {
        self.fields
            .iter()
            .map(|(k, s)| (k.clone(), s.value.clone()))
            .collect()
    }

    /// Cargas del render inicial: todo campo consultado sin dependencia, y
    /// los dependientes cuyo padre ya tiene valor (pre-llenado).
    pub fn initial_requests(&mut self) -> Vec<OptionsRequest> {
        let mut requests = vec![];
        for f in self.step.fields.clone() {
            if !f.is_query_backed() {
                continue;
            }
            match &f.dependency_key {
                None => requests.push(self.begin_load(&f, None, None)),
                Some(dep) => {
                    let parent_value = self.fields.get(dep).map(|s| s.value.clone());
                    if !is_blank(parent_value.as_ref()) {
                        requests.push(self.begin_load(&f, Some(dep.clone()), parent_value));
                    }
                }
            }
        }
        requests
    }

    /// Render inicial completo: emite las cargas iniciales de forma
    /// concurrente y aplica sus resultados.
    pub async fn initialize(&mut self) {
        let requests = self.initial_requests();
        self.run_requests(requests).await;
    }

    /// Cambia el valor de `key` e invalida a todos sus dependientes.
    ///
    /// Cada dependiente directo pierde valor y opciones; si el nuevo valor no
    /// está vacío se devuelve una carga para él, si no queda `Disabled` sin
    /// petición alguna. La limpieza se propaga a los dependientes de los
    /// dependientes.
    pub fn set_value(&mut self, key: &str, value: Value) -> Vec<OptionsRequest> {
        let Some(state) = self.fields.get_mut(key) else {
            warn!("cascade: unknown field \"{key}\" in step \"{}\"", self.step.id);
            return vec![];
        };
        if state.value == value {
            return vec![];
        }
        state.value = value;

        let mut requests = vec![];
        let mut visited: HashSet<String> = HashSet::from([key.to_string()]);
        let mut queue: VecDeque<String> = VecDeque::from([key.to_string()]);

        while let Some(parent) = queue.pop_front() {
            let parent_value = self.fields.get(&parent).map(|s| s.value.clone());
            let parent_blank = is_blank(parent_value.as_ref());
            let dependents: Vec<FormField> = self.step.dependents_of(&parent).cloned().collect();

            for child in dependents {
                if !visited.insert(child.key.clone()) {
                    continue;
                }
                debug!("cascade: reset \"{}\" (parent \"{parent}\" changed)", child.key);
                if let Some(s) = self.fields.get_mut(&child.key) {
                    s.value = Value::Null;
                    s.options.clear();
                    s.phase = FieldPhase::Disabled;
                }
                if !parent_blank {
                    if child.is_query_backed() {
                        requests.push(self.begin_load(&child, Some(parent.clone()), parent_value.clone()));
                    } else if let Some(s) = self.fields.get_mut(&child.key) {
                        s.options = static_options(&child);
                        s.phase = FieldPhase::Idle;
                    }
                }
                queue.push_back(child.key.clone());
            }
        }
        requests
    }

    /// Aplica el resultado de una carga. Devuelve `false` si la petición
    /// quedó obsoleta (el campo fue invalidado después de emitirla).
    pub fn apply_options(&mut self, request: &OptionsRequest, result: Result<Vec<FieldOption>, InvokeError>) -> bool {
        let Some(state) = self.fields.get_mut(&request.field_key) else {
            return false;
        };
        if state.phase != (FieldPhase::Loading { generation: request.generation }) {
            debug!("cascade: stale options for \"{}\" (generation {})", request.field_key, request.generation);
            return false;
        }
        match result {
            Ok(options) => {
                debug!("cascade: \"{}\" loaded {} options", request.field_key, options.len());
                state.options = options;
                state.phase = FieldPhase::Idle;
            }
            Err(source) => {
                let err = EngineError::OptionsLoad { field: request.field_key.clone(),
                                                     source };
                warn!("{err}");
                state.options.clear();
                state.phase = FieldPhase::Failed { message: err.to_string() };
            }
        }
        true
    }

    /// Ejecuta las cargas concurrentemente (sin orden garantizado entre
    /// ellas) y aplica cada resultado.
    pub async fn run_requests(&mut self, requests: Vec<OptionsRequest>) {
        if requests.is_empty() {
            return;
        }
        let loader = self.loader.clone();
        let fetches = requests.into_iter().map(|req| {
                                               let loader = loader.clone();
                                               async move {
                                                   let result = loader.fetch_options(&req.query_name,
                                                                                     req.parent_field.as_deref(),
                                                                                     req.dependency_value.as_ref())
                                                                      .await;
                                                   (req, result)
                                               }
                                           });
        for (req, result) in join_all(fetches).await {
            self.apply_options(&req, result);
        }
    }

    /// `set_value` seguido de las cargas que provoca.
    pub async fn change_value(&mut self, key: &str, value: Value) {
        let requests = self.set_value(key, value);
        self.run_requests(requests).await;
    }

    fn begin_load(&mut self, field: &FormField, parent_field: Option<String>, dependency_value: Option<Value>) -> OptionsRequest {
        self.generation += 1;
        let generation = self.generation;
        if let Some(s) = self.fields.get_mut(&field.key) {
            s.phase = FieldPhase::Loading { generation };
        }
        OptionsRequest { field_key: field.key.clone(),
                         query_name: field.query_name.clone().unwrap_or_default(),
                         parent_field,
                         dependency_value,
                         generation }
    }
}

fn static_options(field: &FormField) -> Vec<FieldOption> {
    if field.query_name.is_none() {
        field.options.clone()
    } else {
        vec![]
    }
}
