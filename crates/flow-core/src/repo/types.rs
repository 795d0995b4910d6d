//! Repositorio de definiciones de flujo (sólo lectura para el motor).
//!
//! El almacenamiento y la edición de definiciones pertenecen al diseñador; el
//! motor únicamente necesita localizar un flujo por id al iniciar o avanzar.
use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::errors::EngineError;
use crate::model::{FlowDefinition, FlowGroup};

/// Búsqueda de definiciones por id a través de todos los grupos.
pub trait FlowRepository: Send + Sync {
    fn find(&self, flow_id: &str) -> Option<Arc<FlowDefinition>>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryFlowRepository {
    groups: Vec<(String, Vec<Arc<FlowDefinition>>)>,
}

impl InMemoryFlowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_groups(groups: Vec<FlowGroup>) -> Self {
        let mut repo = Self::new();
        for g in groups {
            repo.ensure_group(&g.category);
            for f in g.flows {
                repo.insert(&g.category, f);
            }
        }
        repo
    }

    /// Carga grupos desde JSON (`[{category, flows: [...]}, ...]`).
    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let groups: Vec<FlowGroup> =
            serde_json::from_str(raw).map_err(|e| EngineError::InvalidDefinition(format!("flow groups json: {e}")))?;
        for f in groups.iter().flat_map(|g| g.flows.iter()) {
            f.validate()
             .map_err(|e| EngineError::InvalidDefinition(format!("flow \"{}\": {e}", f.id)))?;
        }
        Ok(Self::from_groups(groups))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
                                                            EngineError::InvalidDefinition(format!("{}: {e}",
                                                                                                   path.as_ref().display()))
                                                        })?;
        Self::from_json_str(&raw)
    }

    /// Crea el grupo si no existe (comparación sin distinguir mayúsculas).
    pub fn ensure_group(&mut self, category: &str) {
        if !self.groups.iter().any(|(c, _)| c.eq_ignore_ascii_case(category)) {
            self.groups.push((category.to_string(), vec![]));
        }
    }

    /// Inserta un flujo en la categoría; ids duplicados se ignoran.
    pub fn insert(&mut self, category: &str, flow: FlowDefinition) -> bool {
        if self.find(&flow.id).is_some() {
            debug!("repo:insert skipped duplicated flow id={}", flow.id);
            return false;
        }
        self.ensure_group(category);
        if let Some((_, flows)) = self.groups.iter_mut().find(|(c, _)| c.eq_ignore_ascii_case(category)) {
            flows.push(Arc::new(flow));
        }
        true
    }

    pub fn categories(&self) -> Vec<&str> {
        self.groups.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn flows_in(&self, category: &str) -> Vec<Arc<FlowDefinition>> {
        self.groups
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(category))
            .map(|(_, f)| f.clone())
            .unwrap_or_default()
    }

    pub fn all_flows(&self) -> impl Iterator<Item = &Arc<FlowDefinition>> {
        self.groups.iter().flat_map(|(_, f)| f.iter())
    }
}

impl FlowRepository for InMemoryFlowRepository {
    fn find(&self, flow_id: &str) -> Option<Arc<FlowDefinition>> {
        self.all_flows().find(|f| f.id == flow_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;

    #[test]
    fn finds_across_groups_and_ignores_duplicates() {
        let mut repo = InMemoryFlowRepository::new();
        repo.ensure_group("IT Support");
        assert!(repo.insert("HR", FlowDefinition::new("a", "A")));
        assert!(repo.insert("Academics", FlowDefinition::new("b", "B")));
        assert!(!repo.insert("hr", FlowDefinition::new("a", "again")));

        assert_eq!(repo.categories(), vec!["IT Support", "HR", "Academics"]);
        assert_eq!(repo.find("b").map(|f| f.name.clone()), Some("B".to_string()));
        assert!(repo.find("zzz").is_none());
        assert!(repo.flows_in("it support").is_empty());
    }

    #[test]
    fn json_loading_validates_definitions() {
        let ok = r#"[{"category": "HR", "flows": [{"id": "f", "name": "F", "steps": [{"stepId": "s", "formFields": [{"key": "a", "type": "text"}]}]}]}]"#;
        let repo = InMemoryFlowRepository::from_json_str(ok).expect("valid json");
        let flow = repo.find("f").expect("flow");
        assert_eq!(flow.steps[0].id, "s");
        assert_eq!(flow.steps[0].fields[0].field_type, FieldType::Text);
        assert!(!flow.steps[0].has_query_chain());

        let bad = r#"[{"category": "HR", "flows": [{"id": "f", "name": "F", "steps": [{"stepId": "s", "formFields": [{"key": "a", "type": "select", "dependencyKey": "nope"}]}]}]}]"#;
        assert!(matches!(InMemoryFlowRepository::from_json_str(bad), Err(EngineError::InvalidDefinition(_))));
    }

    #[test]
    fn json_loading_rejects_repeated_step_ids() {
        let raw = r#"[{"category": "HR", "flows": [{"id": "f", "name": "F", "steps": [{"stepId": "x"}, {"stepId": "x"}, {"stepId": "z"}]}]}]"#;
        let err = InMemoryFlowRepository::from_json_str(raw).unwrap_err();
        assert_eq!(err, EngineError::InvalidDefinition("flow \"f\": duplicated step id \"x\"".to_string()));
    }
}
