//! Resolución de parámetros de la cadena.
//!
//! Un mapeo declarativo `{paramKey: "source.path"}` se convierte en un mapa
//! concreto de parámetros leyendo del payload acumulado o del contexto de
//! resultados. La resolución es pura y síncrona.

mod expression;
mod resolve;

pub use expression::{ParamExpr, ParamSource};
pub use resolve::{validate_chain, ParameterResolver, ResolutionPolicy};
