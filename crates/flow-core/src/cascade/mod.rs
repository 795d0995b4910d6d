//! Resolución de campos en cascada.
//!
//! Un campo de selección con `dependency_key` sólo carga opciones cuando su
//! campo padre tiene un valor no vacío; cualquier cambio del padre limpia
//! valor y opciones de todos sus dependientes (transitivamente) antes de
//! emitir la nueva carga.

mod field;
mod resolver;

pub use field::{FieldPhase, FieldState, OptionsRequest};
pub use resolver::CascadingFieldResolver;
