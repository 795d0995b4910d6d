use flow_adapters::CatalogError;
use flow_core::EngineError;
use thiserror::Error;

/// Error de nivel aplicación para los binarios.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error del motor: {0}")]
    Engine(#[from] EngineError),
    #[error("Error de catálogo: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
}
