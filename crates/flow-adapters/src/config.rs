//! Configuración del invoker desde variables de entorno.
//! Usa `QUERY_MOCK_LATENCY_MS` para simular la latencia del backend.

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use log::warn;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const ENV_MOCK_LATENCY_MS: &str = "QUERY_MOCK_LATENCY_MS";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokerConfig {
    pub latency: Duration,
}

impl InvokerConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let latency = match env::var(ENV_MOCK_LATENCY_MS) {
            Ok(raw) => raw.trim().parse::<u64>().map(Duration::from_millis).unwrap_or_else(|e| {
                                                                               warn!("{ENV_MOCK_LATENCY_MS}={raw}: {e}; using 0");
                                                                               Duration::ZERO
                                                                           }),
            Err(_) => Duration::ZERO,
        };
        Self { latency }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}
