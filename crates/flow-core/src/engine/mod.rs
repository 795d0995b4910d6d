//! Engine module for FlowEngine implementation
//!
//! Provides the session state machine, its builder, the session context and
//! the options loader shared with the cascading field resolver.

pub mod builder;
pub mod core;
pub mod flow_ctx;
pub mod options;

pub use builder::{EngineBuilder, EngineBuilderInit};
pub use self::core::{AdvanceRequest, FlowEngine};
pub use flow_ctx::SessionCtx;
pub use options::OptionsLoader;

pub use crate::event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use crate::repo::{FlowRepository, InMemoryFlowRepository};
pub use crate::state::{ExecutionState, FlowStatus};
