//! Ejecución secuencial de cadenas de consultas.

mod executor;

pub use executor::{ChainObserver, NoopObserver, QueryChainExecutor};
