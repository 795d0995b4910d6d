//! Definición inmutable del flujo.
//!
//! Los nombres en el cable siguen la convención camelCase del diseñador
//! (`stepId`, `formFields`, `queryChain`, `resultKey`, `dependencyKey`). El
//! motor nunca muta una definición una vez iniciada la sesión.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::option::FieldOption;

/// Tipo de control de un campo. Suma cerrada: el render y la cascada hacen
/// `match` exhaustivo sobre ella.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Number,
    Date,
    Select,
    Textarea,
    Time,
    DatetimeLocal,
}

impl FieldType {
    /// Campos cuyas opciones provienen de una lista (estática o consultada).
    pub fn is_choice(self) -> bool {
        match self {
            FieldType::Select => true,
            FieldType::Text
            | FieldType::Email
            | FieldType::Password
            | FieldType::Number
            | FieldType::Date
            | FieldType::Textarea
            | FieldType::Time
            | FieldType::DatetimeLocal => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    /// Único dentro del step.
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Opciones estáticas (sin `query_name`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    /// Clave del campo hermano del que dependen las opciones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_key: Option<String>,
}

impl FormField {
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        let key = key.into();
        Self { label: key.clone(),
               key,
               field_type,
               required: false,
               options: vec![],
               query_name: None,
               dependency_key: None }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn query(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = Some(query_name.into());
        self
    }

    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.dependency_key = Some(key.into());
        self
    }

    /// Campo de selección cuyas opciones se cargan desde una consulta.
    pub fn is_query_backed(&self) -> bool {
        self.field_type.is_choice() && self.query_name.is_some()
    }

    pub fn is_dependent(&self) -> bool {
        self.dependency_key.is_some()
    }
}

/// Acción de la cadena: `parameters` mapea `paramKey -> "source.path"` y se
/// conserva en orden de declaración.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryChainAction {
    pub query_name: String,
    pub result_key: String,
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
}

impl QueryChainAction {
    pub fn new(query_name: impl Into<String>, result_key: impl Into<String>) -> Self {
        Self { query_name: query_name.into(),
               result_key: result_key.into(),
               parameters: IndexMap::new() }
    }

    pub fn param(mut self, key: impl Into<String>, expression: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), expression.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    #[serde(rename = "stepId", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "formFields", alias = "fields", default)]
    pub fields: Vec<FormField>,
    /// Vacía => step de formulario puro. No vacía => step con efectos cuyo
    /// avance depende del éxito de la cadena.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_chain: Vec<QueryChainAction>,
}

impl FlowStep {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self { title: id.clone(),
               id,
               description: String::new(),
               fields: vec![],
               query_chain: vec![] }
    }

    pub fn field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn action(mut self, action: QueryChainAction) -> Self {
        self.query_chain.push(action);
        self
    }

    pub fn has_query_chain(&self) -> bool {
        !self.query_chain.is_empty()
    }

    pub fn find_field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Campos que declaran `dependency_key == key`, en orden de despliegue.
    pub fn dependents_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FormField> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.dependency_key.as_deref() == Some(key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<FlowStep>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub available_in_certificates: bool,
}

impl FlowDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(),
               name: name.into(),
               description: String::new(),
               steps: vec![],
               locked: false,
               available_in_certificates: false }
    }

    pub fn step(mut self, step: FlowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    pub fn step_at(&self, index: usize) -> Option<&FlowStep> {
        self.steps.get(index)
    }

    /// Validación estructural mínima: `stepId` únicos en el flujo, claves de
    /// campo únicas por step y `dependency_key` apuntando a un hermano
    /// existente distinto de sí mismo.
    pub fn validate(&self) -> Result<(), String> {
        let mut step_ids = std::collections::HashSet::new();
        for step in &self.steps {
            if !step_ids.insert(step.id.as_str()) {
                return Err(format!("duplicated step id \"{}\"", step.id));
            }
        }
        for step in &self.steps {
            let mut seen = std::collections::HashSet::new();
            for f in &step.fields {
                if !seen.insert(f.key.as_str()) {
                    return Err(format!("step \"{}\": duplicated field key \"{}\"", step.id, f.key));
                }
            }
            for f in &step.fields {
                if let Some(dep) = &f.dependency_key {
                    if dep == &f.key || step.find_field(dep).is_none() {
                        return Err(format!("step \"{}\": field \"{}\" depends on unknown field \"{}\"",
                                           step.id, f.key, dep));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Agrupación de flujos por categoría.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowGroup {
    pub category: String,
    #[serde(default)]
    pub flows: Vec<FlowDefinition>,
}
