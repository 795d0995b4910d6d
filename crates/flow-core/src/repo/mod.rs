pub mod types;
pub use types::{FlowRepository, InMemoryFlowRepository};
