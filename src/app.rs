//! Ensamblado del engine para los binarios.

use std::sync::Arc;

use flow_adapters::{demo_invoker, demo_repository};
use flow_core::{FlowEngine, InMemoryEventStore, InMemoryFlowRepository};
use log::info;

use crate::config::AppConfig;
use crate::errors::AppError;

pub type AppEngine = FlowEngine<InMemoryEventStore, InMemoryFlowRepository>;

/// Instala `tracing-subscriber` como backend del facade `log`.
pub fn init_logging(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Repositorio desde `definitions_path` o los flujos de demostración.
pub fn load_repository(config: &AppConfig) -> Result<InMemoryFlowRepository, AppError> {
    let repo = match &config.definitions_path {
        Some(path) => {
            info!("loading flow definitions from {}", path.display());
            InMemoryFlowRepository::from_json_file(path)?
        }
        None => demo_repository()?,
    };
    Ok(repo)
}

/// Engine en memoria con el catálogo académico.
pub fn build_engine(config: &AppConfig) -> Result<AppEngine, AppError> {
    let repo = load_repository(config)?;
    let invoker = demo_invoker(config.invoker.clone());
    Ok(FlowEngine::builder(InMemoryEventStore::default(), repo).invoker(Arc::new(invoker))
                                                               .config(config.engine.clone())
                                                               .build())
}
