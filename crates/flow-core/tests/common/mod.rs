#![allow(dead_code)]
//! Helpers compartidos por los tests de integración de flow-core.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flow_core::model::Params;
use flow_core::{EngineConfig, ExecutionState, FlowDefinition, FlowEngine, FlowGroup, InMemoryEventStore,
                InMemoryFlowRepository, InvokeError, QueryInvoker};
use serde_json::Value;
use tokio::sync::watch;

/// Invoker guionado: responde por nombre de consulta y registra cada llamada
/// junto con el estado observado en ese instante.
#[derive(Default)]
pub struct ScriptedInvoker {
    responses: HashMap<String, Result<Value, InvokeError>>,
    hang: HashSet<String>,
    calls: Mutex<Vec<(String, Value)>>,
    probe: Mutex<Option<watch::Receiver<ExecutionState>>>,
    observed: Mutex<Vec<&'static str>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, query: &str, result: Value) -> Self {
        self.responses.insert(query.to_string(), Ok(result));
        self
    }

    pub fn fail(mut self, query: &str, message: &str) -> Self {
        self.responses.insert(query.to_string(), Err(InvokeError::Backend(message.to_string())));
        self
    }

    /// La consulta nunca responde.
    pub fn hang(mut self, query: &str) -> Self {
        self.hang.insert(query.to_string());
        self
    }

    pub fn attach(&self, rx: watch::Receiver<ExecutionState>) {
        *self.probe.lock().unwrap() = Some(rx);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(q, _)| q).collect()
    }

    /// Estado publicado visto por el backend en cada invocación.
    pub fn observed_status(&self) -> Vec<&'static str> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryInvoker for ScriptedInvoker {
    async fn invoke(&self, query_name: &str, params: &Params) -> Result<Value, InvokeError> {
        self.calls.lock().unwrap().push((query_name.to_string(), Value::Object(params.clone())));
        if let Some(rx) = self.probe.lock().unwrap().as_ref() {
            let status = rx.borrow().status_name();
            self.observed.lock().unwrap().push(status);
        }
        if self.hang.contains(query_name) {
            std::future::pending::<()>().await;
        }
        self.responses
            .get(query_name)
            .cloned()
            .unwrap_or_else(|| Err(InvokeError::UnknownQuery(query_name.to_string())))
    }
}

pub type MemEngine = FlowEngine<InMemoryEventStore, InMemoryFlowRepository>;

pub fn engine_for(flows: Vec<FlowDefinition>, invoker: Arc<ScriptedInvoker>) -> MemEngine {
    engine_with_config(flows, invoker, EngineConfig::default())
}

pub fn engine_with_config(flows: Vec<FlowDefinition>, invoker: Arc<ScriptedInvoker>, config: EngineConfig) -> MemEngine {
    let repo = InMemoryFlowRepository::from_groups(vec![FlowGroup { category: "Tests".into(),
                                                                    flows }]);
    let engine = FlowEngine::builder(InMemoryEventStore::default(), repo).invoker(invoker.clone())
                                                                         .config(config)
                                                                         .build();
    invoker.attach(engine.subscribe());
    engine
}

pub fn obj(v: Value) -> flow_core::Payload {
    match v {
        Value::Object(m) => m,
        other => panic!("expected object, got {other}"),
    }
}
