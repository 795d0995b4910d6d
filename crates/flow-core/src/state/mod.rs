//! Estado observable de una sesión de ejecución.

mod execution;

pub use execution::{ExecutionState, FlowStatus};
