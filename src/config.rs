//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
use std::env;
use std::path::PathBuf;

use flow_adapters::InvokerConfig;
use flow_core::config::init_dotenv;
use flow_core::EngineConfig;
use once_cell::sync::Lazy;

pub const ENV_LOG: &str = "FLOW_LOG";
pub const ENV_DEFINITIONS: &str = "FLOW_DEFINITIONS";

/// Configuración global de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub invoker: InvokerConfig,
    /// Filtro por defecto cuando `RUST_LOG` no está definido.
    pub log_filter: String,
    /// Archivo JSON con grupos de flujos; `None` usa los de demostración.
    pub definitions_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        Self { engine: EngineConfig::from_env(),
               invoker: InvokerConfig::from_env(),
               log_filter: env::var(ENV_LOG).unwrap_or_else(|_| "info".to_string()),
               definitions_path: env::var(ENV_DEFINITIONS).ok().filter(|p| !p.is_empty()).map(PathBuf::from) }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { engine: EngineConfig::default(),
               invoker: InvokerConfig::default(),
               log_filter: "info".to_string(),
               definitions_path: None }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
