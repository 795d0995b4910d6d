use std::collections::HashSet;
use std::str::FromStr;

use indexmap::IndexMap;
use log::warn;
use serde_json::Value;

use super::expression::{ParamExpr, ParamSource};
use crate::errors::{ChainError, ResolveError};
use crate::model::{Params, Payload, QueryChainAction, ResultsContext};

/// Qué hacer cuando un segmento intermedio de la ruta no existe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// Falla la acción en tiempo de resolución (`UnresolvedPath`).
    #[default]
    Strict,
    /// Resuelve a `null`, registra un warning y deja que el invoker decida.
    Lenient,
}

impl FromStr for ResolutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown resolution policy \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterResolver {
    policy: ResolutionPolicy,
}

impl ParameterResolver {
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Resuelve cada `(paramKey, expression)` contra `payload` y `results`.
    ///
    /// Una fuente distinta de `payload`/`results` es siempre un error. Una
    /// referencia `results.X` sin `X` en el contexto también, sin importar la
    /// política: sólo acciones anteriores de la misma cadena producen `X`.
    pub fn resolve(&self,
                   mapping: &IndexMap<String, String>,
                   payload: &Payload,
                   results: &ResultsContext)
                   -> Result<Params, ResolveError> {
        let mut resolved = Params::new();
        for (param_key, expression) in mapping {
            let expr = ParamExpr::parse(expression)?;
            let value = self.resolve_expr(&expr, payload, results)?;
            resolved.insert(param_key.clone(), value);
        }
        Ok(resolved)
    }

    fn resolve_expr(&self, expr: &ParamExpr, payload: &Payload, results: &ResultsContext) -> Result<Value, ResolveError> {
        let root = match expr.source() {
            ParamSource::Payload => payload,
            ParamSource::Results => {
                if !results.contains(expr.root_key()) {
                    return Err(ResolveError::UnknownResult { expression: expr.to_string(),
                                                             result_key: expr.root_key().to_string() });
                }
                results.as_map()
            }
        };
        match expr.lookup(root) {
            Ok(v) => Ok(v.clone()),
            Err(segment) => match self.policy {
                ResolutionPolicy::Strict => Err(ResolveError::UnresolvedPath { expression: expr.to_string(),
                                                                               segment: segment.to_string() }),
                ResolutionPolicy::Lenient => {
                    warn!("Could not resolve value for mapping \"{expr}\". Resulting parameter will be null.");
                    Ok(Value::Null)
                }
            },
        }
    }
}

/// Validación estática de una cadena antes de ejecutar la primera acción:
/// todas las expresiones deben parsear y cada `results.X` debe nombrar el
/// `result_key` de una acción anterior.
pub fn validate_chain(chain: &[QueryChainAction]) -> Result<(), ChainError> {
    let mut produced: HashSet<&str> = HashSet::new();
    for (index, action) in chain.iter().enumerate() {
        for expression in action.parameters.values() {
            let check = ParamExpr::parse(expression).and_then(|expr| {
                                                        if expr.source() == ParamSource::Results
                                                           && !produced.contains(expr.root_key())
                                                        {
                                                            Err(ResolveError::UnknownResult { expression: expression.clone(),
                                                                                              result_key: expr.root_key().to_string() })
                                                        } else {
                                                            Ok(())
                                                        }
                                                    });
            if let Err(e) = check {
                return Err(ChainError { action_index: index,
                                        query_name: action.query_name.clone(),
                                        result_key: action.result_key.clone(),
                                        cause: e.into() });
            }
        }
        produced.insert(action.result_key.as_str());
    }
    Ok(())
}
