//! Contextos de ejecución.
//!
//! - `Payload`: mapa acumulado `field key -> valor` (completedStepsPayload).
//! - `ResultsContext`: mapa `resultKey -> resultado`, vive sólo durante una
//!   ejecución de cadena.
//! - `Params`: parámetros concretos ya resueltos para una invocación.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Payload = Map<String, Value>;
pub type Params = Map<String, Value>;

/// Merge shallow: las claves de `incoming` reemplazan a las de `base`.
///
/// Contrato explícito para colisiones entre steps: gana la última escritura.
pub fn merge_payload(base: &Payload, incoming: &Payload) -> Payload {
    let mut out = base.clone();
    for (k, v) in incoming.iter() {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Un valor "vacío" no satisface una dependencia: `null`, `""` o `[]`.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

/// Resultados acumulados de las acciones ya ejecutadas de la cadena actual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsContext {
    entries: Map<String, Value>,
}

impl ResultsContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sólo el executor escribe aquí; los lectores reciben `&ResultsContext`.
    pub(crate) fn insert(&mut self, result_key: &str, result: Value) {
        self.entries.insert(result_key.to_string(), result);
    }

    pub fn get(&self, result_key: &str) -> Option<&Value> {
        self.entries.get(result_key)
    }

    pub fn contains(&self, result_key: &str) -> bool {
        self.entries.contains_key(result_key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }
}

impl FromIterator<(String, Value)> for ResultsContext {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Payload {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn merge_is_shallow_last_write_wins() {
        let a = obj(json!({"x": 1, "nested": {"a": 1}, "keep": "a"}));
        let b = obj(json!({"x": 2, "nested": {"b": 2}}));
        let out = merge_payload(&a, &b);
        assert_eq!(out["x"], json!(2));
        // los objetos anidados se reemplazan completos, no se fusionan
        assert_eq!(out["nested"], json!({"b": 2}));
        assert_eq!(out["keep"], json!("a"));
    }

    #[test]
    fn blank_values() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!(null))));
        assert!(is_blank(Some(&json!(""))));
        assert!(is_blank(Some(&json!([]))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!("sci"))));
    }

    #[test]
    fn results_context_serializes_as_plain_map() {
        let mut ctx = ResultsContext::new();
        ctx.insert("r", json!({"id": 7}));
        assert_eq!(serde_json::to_value(&ctx).unwrap_or_default(), json!({"r": {"id": 7}}));
        assert_eq!(ctx.into_value(), json!({"r": {"id": 7}}));
    }
}
