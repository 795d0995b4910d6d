//! Carga de opciones para campos de selección respaldados por una consulta.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::invoker::{InvokeError, QueryInvoker};
use crate::model::{FieldOption, Params};

/// Handle clonable que comparte el invoker del engine. La cascada lo usa
/// fuera del `&mut FlowEngine`, por eso no toma prestado el engine.
#[derive(Clone)]
pub struct OptionsLoader {
    invoker: Arc<dyn QueryInvoker>,
}

impl OptionsLoader {
    pub fn new(invoker: Arc<dyn QueryInvoker>) -> Self {
        Self { invoker }
    }

    /// Ejecuta `query_name` y devuelve sus opciones `{value, label}`.
    ///
    /// Si hay `parent_field` y `dependency_value`, el valor se liga al primer
    /// parámetro declarado cuya clave contiene la clave del padre (sin
    /// distinguir mayúsculas). Sin metadatos de parámetros se usa la clave
    /// del padre tal cual.
    pub async fn fetch_options(&self,
                               query_name: &str,
                               parent_field: Option<&str>,
                               dependency_value: Option<&Value>)
                               -> Result<Vec<FieldOption>, InvokeError> {
        let params = self.bind_dependency(query_name, parent_field, dependency_value);
        debug!("options:fetch query={query_name} params={}", Value::Object(params.clone()));

        let raw = self.invoker.invoke(query_name, &params).await?;
        FieldOption::list_from_value(raw).map_err(|e| {
                                             warn!("Query \"{query_name}\" returned a non-option payload: {e}");
                                             InvokeError::Backend(format!("invalid options payload from \"{query_name}\": {e}"))
                                         })
    }

    fn bind_dependency(&self, query_name: &str, parent_field: Option<&str>, dependency_value: Option<&Value>) -> Params {
        let mut params = Params::new();
        let (Some(parent), Some(value)) = (parent_field, dependency_value) else {
            return params;
        };
        let needle = parent.to_lowercase();
        match self.invoker.declared_parameters(query_name) {
            Some(declared) => {
                if let Some(p) = declared.iter().find(|p| p.key.to_lowercase().contains(&needle)) {
                    params.insert(p.key.clone(), value.clone());
                } else {
                    debug!("options:bind query={query_name} has no parameter matching \"{parent}\"");
                }
            }
            None => {
                params.insert(parent.to_string(), value.clone());
            }
        }
        params
    }
}

impl std::fmt::Debug for OptionsLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsLoader").finish_non_exhaustive()
    }
}
