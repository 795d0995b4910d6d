//! Configuración del motor desde variables de entorno.
//! Usa `FLOW_PARAM_RESOLUTION` (`strict` | `lenient`).

use std::env;

use dotenvy::dotenv;
use log::warn;
use once_cell::sync::Lazy;

use crate::resolver::ResolutionPolicy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const ENV_PARAM_RESOLUTION: &str = "FLOW_PARAM_RESOLUTION";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub param_resolution: ResolutionPolicy,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let param_resolution = match env::var(ENV_PARAM_RESOLUTION) {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                                      warn!("{ENV_PARAM_RESOLUTION}: {e}; using strict");
                                      ResolutionPolicy::Strict
                                  }),
            Err(_) => ResolutionPolicy::default(),
        };
        Self { param_resolution }
    }

    pub fn with_resolution(mut self, policy: ResolutionPolicy) -> Self {
        self.param_resolution = policy;
        self
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
