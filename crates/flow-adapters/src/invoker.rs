//! `QueryInvoker` respaldado por el catálogo.
//!
//! Cada invocación: busca la consulta, valida parámetros, espera la latencia
//! simulada y delega en el handler registrado para su `target_endpoint`.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use flow_core::model::Params;
use flow_core::{InvokeError, QueryInvoker, QueryParameter};
use log::{debug, info};
use serde_json::Value;

use crate::catalog::QueryCatalog;
use crate::config::InvokerConfig;
use crate::validation::validate_params;

/// Implementación concreta de un endpoint del backend.
#[async_trait]
pub trait EndpointHandler: Send + Sync {
    async fn call(&self, params: &Params) -> Result<Value, InvokeError>;
}

#[async_trait]
impl<F> EndpointHandler for F where F: Fn(&Params) -> Result<Value, InvokeError> + Send + Sync
{
    async fn call(&self, params: &Params) -> Result<Value, InvokeError> {
        (self)(params)
    }
}

pub struct CatalogQueryInvoker {
    catalog: Arc<QueryCatalog>,
    handlers: DashMap<String, Arc<dyn EndpointHandler>>,
    config: InvokerConfig,
}

impl CatalogQueryInvoker {
    pub fn new(catalog: Arc<QueryCatalog>, config: InvokerConfig) -> Self {
        Self { catalog,
               handlers: DashMap::new(),
               config }
    }

    pub fn catalog(&self) -> &Arc<QueryCatalog> {
        &self.catalog
    }

    /// Registra (o reemplaza) el handler de `endpoint`.
    pub fn register(&self, endpoint: impl Into<String>, handler: impl EndpointHandler + 'static) {
        self.handlers.insert(endpoint.into(), Arc::new(handler));
    }

    pub fn has_handler(&self, endpoint: &str) -> bool {
        self.handlers.contains_key(endpoint)
    }
}

#[async_trait]
impl QueryInvoker for CatalogQueryInvoker {
    async fn invoke(&self, query_name: &str, params: &Params) -> Result<Value, InvokeError> {
        let query = self.catalog
                        .get(query_name)
                        .ok_or_else(|| InvokeError::UnknownQuery(query_name.to_string()))?;
        validate_params(&query, params)?;

        info!("Executing query: {query_name} params={}", Value::Object(params.clone()));
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        // se clona el Arc para no retener el guard del DashMap durante el await
        let handler = self.handlers
                          .get(&query.target_endpoint)
                          .map(|h| h.value().clone())
                          .ok_or_else(|| {
                              InvokeError::Backend(format!("Mock endpoint for \"{}\" not implemented.", query.target_endpoint))
                          })?;
        let result = handler.call(params).await;
        debug!("query {query_name} finished ok={}", result.is_ok());
        result
    }

    fn declared_parameters(&self, query_name: &str) -> Option<Vec<QueryParameter>> {
        self.catalog.get(query_name).map(|q| q.parameters)
    }
}

impl std::fmt::Debug for CatalogQueryInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogQueryInvoker")
         .field("queries", &self.catalog.len())
         .field("handlers", &self.handlers.len())
         .field("config", &self.config)
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CustomQuery;
    use flow_core::ParamType;
    use serde_json::json;

    fn invoker() -> CatalogQueryInvoker {
        let catalog = QueryCatalog::with_queries([CustomQuery::new("ECHO").param(QueryParameter::new("id", ParamType::Number, true)),
                                                  CustomQuery::new("ORPHAN")]);
        let inv = CatalogQueryInvoker::new(Arc::new(catalog), InvokerConfig::default());
        inv.register("ECHO", |p: &Params| -> Result<Value, InvokeError> { Ok(Value::Object(p.clone())) });
        inv
    }

    #[tokio::test]
    async fn validates_then_dispatches_to_endpoint() {
        let inv = invoker();
        let mut p = Params::new();
        p.insert("id".into(), json!(7));
        assert_eq!(inv.invoke("ECHO", &p).await.unwrap(), json!({"id": 7}));

        let err = inv.invoke("ECHO", &Params::new()).await.unwrap_err();
        assert!(matches!(err, InvokeError::MissingParameter { .. }));
    }

    #[tokio::test]
    async fn unknown_query_and_missing_endpoint_fail() {
        let inv = invoker();
        assert_eq!(inv.invoke("NOPE", &Params::new()).await.unwrap_err().to_string(), "Query \"NOPE\" not found.");
        let err = inv.invoke("ORPHAN", &Params::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Mock endpoint for \"ORPHAN\" not implemented.");
    }

    #[test]
    fn configured_latency_delays_dispatch() {
        let inv = CatalogQueryInvoker::new(Arc::new(QueryCatalog::with_queries([CustomQuery::new("PING")])),
                                           InvokerConfig::default().with_latency(std::time::Duration::from_millis(20)));
        inv.register("PING", |_: &Params| -> Result<Value, InvokeError> { Ok(json!("pong")) });
        let started = std::time::Instant::now();
        let out = tokio_test::block_on(inv.invoke("PING", &Params::new())).unwrap();
        assert_eq!(out, json!("pong"));
        assert!(started.elapsed() >= std::time::Duration::from_millis(20));
    }

    #[test]
    fn publishes_declared_parameters() {
        let inv = invoker();
        assert_eq!(inv.declared_parameters("ECHO").map(|p| p.len()), Some(1));
        assert!(inv.declared_parameters("NOPE").is_none());
    }
}
