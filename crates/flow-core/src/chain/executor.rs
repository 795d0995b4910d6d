//! `QueryChainExecutor`: ejecuta las acciones estrictamente en orden de
//! declaración, alimentando un `ResultsContext` compartido.
//!
//! Invariantes:
//! - nunca hay dos acciones en vuelo a la vez;
//! - la primera falla aborta la cadena, las acciones restantes no se invocan;
//! - no existe éxito parcial ni rollback de efectos ya aplicados upstream.
use log::{debug, error};
use serde_json::Value;

use crate::errors::{ChainError, ChainFailure};
use crate::invoker::QueryInvoker;
use crate::model::{Params, Payload, QueryChainAction, ResultsContext};
use crate::resolver::{validate_chain, ParameterResolver};

/// Observador del progreso de la cadena (el engine lo usa para registrar
/// eventos de sesión).
pub trait ChainObserver: Send {
    fn action_started(&mut self, _index: usize, _action: &QueryChainAction, _params: &Params) {}
    fn action_finished(&mut self, _index: usize, _action: &QueryChainAction, _result: &Value) {}
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl ChainObserver for NoopObserver {}

pub struct QueryChainExecutor<'a> {
    invoker: &'a dyn QueryInvoker,
    resolver: ParameterResolver,
}

impl<'a> QueryChainExecutor<'a> {
    pub fn new(invoker: &'a dyn QueryInvoker, resolver: ParameterResolver) -> Self {
        Self { invoker, resolver }
    }

    /// Ejecuta la cadena completa; devuelve el contexto sólo si todas las
    /// acciones tuvieron éxito.
    pub async fn execute(&self, chain: &[QueryChainAction], payload: &Payload) -> Result<ResultsContext, ChainError> {
        self.execute_observed(chain, payload, &mut NoopObserver).await
    }

    pub async fn execute_observed(&self,
                                  chain: &[QueryChainAction],
                                  payload: &Payload,
                                  observer: &mut dyn ChainObserver)
                                  -> Result<ResultsContext, ChainError> {
        validate_chain(chain).inspect_err(|e| error!("Query chain rejected before execution: {e}"))?;

        let mut results = ResultsContext::new();
        for (index, action) in chain.iter().enumerate() {
            let fail = |cause: ChainFailure| ChainError { action_index: index,
                                                          query_name: action.query_name.clone(),
                                                          result_key: action.result_key.clone(),
                                                          cause };

            let params = self.resolver
                             .resolve(&action.parameters, payload, &results)
                             .map_err(|e| fail(e.into()))?;

            debug!("chain:action:start index={index} query={} params={}", action.query_name, Value::Object(params.clone()));
            observer.action_started(index, action, &params);

            let result = match self.invoker.invoke(&action.query_name, &params).await {
                Ok(r) => r,
                Err(e) => {
                    let err = fail(e.into());
                    error!("Query Chain Failed: {err}");
                    return Err(err);
                }
            };

            debug!("chain:action:done index={index} query={} result_key={}", action.query_name, action.result_key);
            observer.action_finished(index, action, &result);
            results.insert(&action.result_key, result);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::InvokeError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Invoker guionado que registra cada llamada.
    #[derive(Default)]
    struct Scripted {
        calls: Mutex<Vec<(String, Params)>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl QueryInvoker for Scripted {
        async fn invoke(&self, query_name: &str, params: &Params) -> Result<Value, InvokeError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((query_name.to_string(), params.clone()));
            }
            if self.fail_on == Some(query_name) {
                return Err(InvokeError::Backend(format!("{query_name} exploded")));
            }
            Ok(json!({"query": query_name, "id": format!("{query_name}-1")}))
        }
    }

    fn called(inv: &Scripted) -> Vec<String> {
        inv.calls.lock().map(|c| c.iter().map(|(q, _)| q.clone()).collect()).unwrap_or_default()
    }

    #[tokio::test]
    async fn threads_results_into_later_actions() {
        let inv = Scripted::default();
        let chain = vec![QueryChainAction::new("ENROLL", "enrollment").param("name", "payload.name"),
                         QueryChainAction::new("ASSIGN", "course").param("studentId", "results.enrollment.id")];
        let payload = json!({"name": "Ada"}).as_object().cloned().unwrap_or_default();
        let exec = QueryChainExecutor::new(&inv, ParameterResolver::default());
        let results = exec.execute(&chain, &payload).await.expect("chain succeeds");

        assert_eq!(results.len(), 2);
        let calls = inv.calls.lock().expect("lock").clone();
        assert_eq!(calls[1].1.get("studentId"), Some(&json!("ENROLL-1")));
    }

    #[tokio::test]
    async fn fails_fast_and_names_failing_query() {
        let inv = Scripted { fail_on: Some("SECOND"),
                             ..Default::default() };
        let chain = vec![QueryChainAction::new("FIRST", "a"),
                         QueryChainAction::new("SECOND", "b"),
                         QueryChainAction::new("THIRD", "c")];
        let exec = QueryChainExecutor::new(&inv, ParameterResolver::default());
        let err = exec.execute(&chain, &Payload::new()).await.unwrap_err();

        assert_eq!(called(&inv), vec!["FIRST", "SECOND"]);
        assert_eq!(err.action_index, 1);
        assert_eq!(err.query_name, "SECOND");
        assert!(err.to_string().contains("SECOND"));
        assert!(matches!(err.cause, ChainFailure::Invocation(_)));
    }

    #[tokio::test]
    async fn resolution_failure_stops_before_invoking() {
        let inv = Scripted::default();
        let chain = vec![QueryChainAction::new("FIRST", "a").param("x", "payload.present"),
                         QueryChainAction::new("SECOND", "b").param("y", "payload.absent.deep")];
        let payload = json!({"present": 1}).as_object().cloned().unwrap_or_default();
        let exec = QueryChainExecutor::new(&inv, ParameterResolver::default());
        let err = exec.execute(&chain, &payload).await.unwrap_err();

        assert_eq!(called(&inv), vec!["FIRST"]);
        assert_eq!(err.query_name, "SECOND");
        assert!(matches!(err.cause, ChainFailure::Resolution(_)));
    }

    #[tokio::test]
    async fn malformed_later_action_prevents_any_side_effect() {
        let inv = Scripted::default();
        let chain = vec![QueryChainAction::new("FIRST", "a"),
                         QueryChainAction::new("SECOND", "b").param("y", "form.y")];
        let exec = QueryChainExecutor::new(&inv, ParameterResolver::default());
        let err = exec.execute(&chain, &Payload::new()).await.unwrap_err();
        assert!(called(&inv).is_empty());
        assert_eq!(err.action_index, 1);
    }

    #[test]
    fn empty_chain_yields_empty_context() {
        let inv = Scripted::default();
        let exec = QueryChainExecutor::new(&inv, ParameterResolver::default());
        let results = tokio_test::block_on(exec.execute(&[], &Payload::new())).expect("empty chain");
        assert!(results.is_empty());
    }
}
