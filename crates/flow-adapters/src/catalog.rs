//! Catálogo de consultas (`CustomQuery`).
//!
//! Descriptores por nombre con parámetros tipados. Una consulta bloqueada no
//! se puede actualizar ni borrar; el bloqueo se alterna explícitamente.

use dashmap::DashMap;
use flow_core::QueryParameter;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomQuery {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Handler que atiende la consulta en el backend.
    pub target_endpoint: String,
    /// Consulta de catálogo: devuelve opciones `{value, label}`.
    #[serde(default)]
    pub is_catalog: bool,
    #[serde(default)]
    pub parameters: Vec<QueryParameter>,
    #[serde(default)]
    pub locked: bool,
}

impl CustomQuery {
    /// Consulta cuyo endpoint coincide con su nombre.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { target_endpoint: name.clone(),
               name,
               description: String::new(),
               is_catalog: false,
               parameters: vec![],
               locked: false }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn catalog(mut self) -> Self {
        self.is_catalog = true;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn param(mut self, parameter: QueryParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CatalogError {
    #[error("Query with this name already exists.")]
    Duplicate(String),
    #[error("Cannot update a locked query.")]
    UpdateLocked(String),
    #[error("Cannot delete a locked query.")]
    DeleteLocked(String),
    #[error("Query \"{0}\" not found.")]
    NotFound(String),
}

#[derive(Debug, Default)]
pub struct QueryCatalog {
    queries: DashMap<String, CustomQuery>,
}

impl QueryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catálogo pre-cargado; si hay nombres repetidos gana el último.
    pub fn with_queries(queries: impl IntoIterator<Item = CustomQuery>) -> Self {
        let catalog = Self::new();
        for q in queries {
            catalog.queries.insert(q.name.clone(), q);
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<CustomQuery> {
        self.queries.get(name).map(|q| q.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Consultas ordenadas por nombre.
    pub fn list(&self) -> Vec<CustomQuery> {
        let mut all: Vec<CustomQuery> = self.queries.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn create(&self, query: CustomQuery) -> Result<(), CatalogError> {
        use dashmap::mapref::entry::Entry;
        match self.queries.entry(query.name.clone()) {
            Entry::Occupied(_) => Err(CatalogError::Duplicate(query.name)),
            Entry::Vacant(slot) => {
                info!("catalog: created query {}", query.name);
                slot.insert(query);
                Ok(())
            }
        }
    }

    pub fn update(&self, query: CustomQuery) -> Result<(), CatalogError> {
        let mut current = self.queries
                              .get_mut(&query.name)
                              .ok_or_else(|| CatalogError::NotFound(query.name.clone()))?;
        if current.locked {
            return Err(CatalogError::UpdateLocked(query.name));
        }
        info!("catalog: updated query {}", query.name);
        *current = query;
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<CustomQuery, CatalogError> {
        let locked = self.queries.get(name).map(|q| q.locked);
        match locked {
            None => return Err(CatalogError::NotFound(name.to_string())),
            Some(true) => return Err(CatalogError::DeleteLocked(name.to_string())),
            Some(false) => {}
        }
        self.queries
            .remove(name)
            .map(|(_, q)| q)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Alterna el bloqueo y devuelve el nuevo valor.
    pub fn toggle_lock(&self, name: &str) -> Result<bool, CatalogError> {
        let mut q = self.queries
                        .get_mut(name)
                        .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        q.locked = !q.locked;
        Ok(q.locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::ParamType;

    fn sample() -> QueryCatalog {
        QueryCatalog::with_queries([CustomQuery::new("A").locked(),
                                    CustomQuery::new("B").param(QueryParameter::new("id", ParamType::String, true))])
    }

    #[test]
    fn create_rejects_duplicates() {
        let c = sample();
        assert_eq!(c.create(CustomQuery::new("A")), Err(CatalogError::Duplicate("A".into())));
        assert!(c.create(CustomQuery::new("C")).is_ok());
        assert_eq!(c.list().iter().map(|q| q.name.as_str()).collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }

    #[test]
    fn locked_queries_are_read_only() {
        let c = sample();
        assert_eq!(c.update(CustomQuery::new("A").describe("x")), Err(CatalogError::UpdateLocked("A".into())));
        assert_eq!(c.delete("A"), Err(CatalogError::DeleteLocked("A".into())));
        assert_eq!(c.toggle_lock("A"), Ok(false));
        assert!(c.update(CustomQuery::new("A").describe("x")).is_ok());
        assert_eq!(c.get("A").map(|q| q.description), Some("x".to_string()));
        assert!(c.delete("A").is_ok());
        assert!(!c.contains("A"));
    }

    #[test]
    fn missing_queries_report_not_found() {
        let c = sample();
        assert_eq!(c.update(CustomQuery::new("Z")), Err(CatalogError::NotFound("Z".into())));
        assert_eq!(c.toggle_lock("Z"), Err(CatalogError::NotFound("Z".into())));
    }

    #[test]
    fn wire_format_is_camel_case() {
        let q: CustomQuery = serde_json::from_value(serde_json::json!({
            "name": "GET_CAREERS_BY_FACULTY",
            "targetEndpoint": "GET_CAREERS_BY_FACULTY",
            "isCatalog": true,
            "parameters": [{"key": "facultyId", "label": "Faculty ID", "type": "string", "required": true}]
        })).unwrap();
        assert!(q.is_catalog && !q.locked);
        assert_eq!(q.parameters[0].param_type, ParamType::String);
    }
}
