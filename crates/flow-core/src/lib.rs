//! flow-core: motor de ejecución de flujos multi-step.
//!
//! Máquina de estados de sesión, lenguaje de expresiones de parámetros,
//! ejecutor secuencial de cadenas de consultas y resolución de campos en
//! cascada. El backend de consultas se inyecta vía `QueryInvoker`.
pub mod cascade;
pub mod chain;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod invoker;
pub mod model;
pub mod repo;
pub mod resolver;
pub mod state;

pub use cascade::{CascadingFieldResolver, FieldPhase, FieldState, OptionsRequest};
pub use chain::QueryChainExecutor;
pub use config::EngineConfig;
pub use engine::{AdvanceRequest, FlowEngine, OptionsLoader, SessionCtx};
pub use errors::{ChainError, ChainFailure, EngineError, ResolveError};
pub use event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use invoker::{InvokeError, ParamType, QueryInvoker, QueryParameter};
pub use model::{FieldOption, FieldType, FlowDefinition, FlowGroup, FlowStep, FormField, Payload, QueryChainAction,
                ResultsContext};
pub use repo::{FlowRepository, InMemoryFlowRepository};
pub use resolver::{ParameterResolver, ResolutionPolicy};
pub use state::{ExecutionState, FlowStatus};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl QueryInvoker for Echo {
        async fn invoke(&self, _query_name: &str, params: &model::Params) -> Result<Value, InvokeError> {
            Ok(Value::Object(params.clone()))
        }
    }

    #[test]
    fn builder_wires_engine_in_loading_state() {
        let repo = InMemoryFlowRepository::from_groups(vec![FlowGroup { category: "G".into(),
                                                                        flows: vec![FlowDefinition::new("f", "F").step(FlowStep::new("s1"))] }]);
        let mut engine = FlowEngine::builder(InMemoryEventStore::default(), repo).invoker(Arc::new(Echo))
                                                                                 .config(EngineConfig::default())
                                                                                 .build();
        assert!(engine.state().is_loading());
        engine.start_flow("f").expect("flow exists");
        assert_eq!(engine.state().current_step_index(), Some(0));
        assert_eq!(engine.event_variants(), vec!["I"]);
        let snapshot = engine.subscribe().borrow().clone();
        assert_eq!(&snapshot, engine.state());
        assert_eq!(serde_json::to_value(engine.state()).unwrap()["status"], json!("ready"));
    }
}
