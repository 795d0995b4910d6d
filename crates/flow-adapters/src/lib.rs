//! flow-adapters: implementaciones del `QueryInvoker` para flow-core.
//!
//! Este crate provee:
//! - `QueryCatalog`: descriptores `CustomQuery` con parámetros tipados y
//!   bloqueo contra edición.
//! - Validación de parámetros (requeridos, número, fecha) previa a invocar.
//! - `CatalogQueryInvoker`: invoker en memoria que despacha por
//!   `target_endpoint` a handlers registrados, con latencia simulada.
//! - Catálogo académico y flujos de demostración.

pub mod catalog;
pub mod config;
pub mod demo;
pub mod invoker;
pub mod validation;

pub use catalog::{CatalogError, CustomQuery, QueryCatalog};
pub use config::InvokerConfig;
pub use demo::{demo_invoker, demo_repository};
pub use invoker::{CatalogQueryInvoker, EndpointHandler};
pub use validation::validate_params;
