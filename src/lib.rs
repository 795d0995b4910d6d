//! FormFlow
//!
//! Librería fachada del workspace:
//! - Expone `config` (configuración global) y `errors` (`AppError`).
//! - `app` arma el engine con el catálogo y los flujos configurados.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub mod app;
pub mod config;
pub mod errors;

pub use flow_adapters;
pub use flow_core;
