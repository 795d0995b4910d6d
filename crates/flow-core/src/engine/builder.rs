//! Builder para `FlowEngine`.
//!
//! Dos etapas:
//! - `EngineBuilderInit` tiene las stores (event_store + repository) y sólo
//!   permite declarar el `QueryInvoker`; un engine sin invoker no compila.
//! - `EngineBuilder` acepta configuración opcional y construye el engine.
//!
//! ```ignore
//! let engine = FlowEngine::builder(InMemoryEventStore::default(), repo)
//!     .invoker(Arc::new(my_invoker))
//!     .config(EngineConfig::default().with_resolution(ResolutionPolicy::Lenient))
//!     .build();
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::FlowEngine;
use crate::event::EventStore;
use crate::invoker::QueryInvoker;
use crate::repo::FlowRepository;

/// Estado inicial del builder.
#[derive(Debug)]
pub struct EngineBuilderInit<E: EventStore, R: FlowRepository> {
    /// Store de eventos que usará el engine.
    pub event_store: E,
    /// Repositorio de definiciones de flujo.
    pub repository: R,
}

impl<E: EventStore, R: FlowRepository> EngineBuilderInit<E, R> {
    /// Declara el backend de consultas y transiciona al builder completo.
    #[inline]
    pub fn invoker(self, invoker: Arc<dyn QueryInvoker>) -> EngineBuilder<E, R> {
        EngineBuilder { event_store: self.event_store,
                        repository: self.repository,
                        invoker,
                        config: None }
    }
}

pub struct EngineBuilder<E: EventStore, R: FlowRepository> {
    event_store: E,
    repository: R,
    invoker: Arc<dyn QueryInvoker>,
    /// `None` => se lee del entorno en `build`.
    config: Option<EngineConfig>,
}

impl<E: EventStore, R: FlowRepository> EngineBuilder<E, R> {
    #[inline]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Construye el `FlowEngine`; la sesión queda en `loading` hasta el
    /// primer `start_flow`.
    #[inline]
    pub fn build(self) -> FlowEngine<E, R> {
        let config = self.config.unwrap_or_else(EngineConfig::from_env);
        FlowEngine::new_with_stores(self.event_store, self.repository, self.invoker, config)
    }
}
