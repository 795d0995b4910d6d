//! Mini lenguaje de expresiones `source.path.to.value`.
//!
//! Se parte en `.`: el primer segmento es la fuente (`payload` | `results`)
//! y el resto es la ruta que se recorre en profundidad.
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::constants::{PATH_SEPARATOR, SOURCE_PAYLOAD, SOURCE_RESULTS};
use crate::errors::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSource {
    Payload,
    Results,
}

impl ParamSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamSource::Payload => SOURCE_PAYLOAD,
            ParamSource::Results => SOURCE_RESULTS,
        }
    }
}

/// Expresión ya parseada. `path` nunca está vacío.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamExpr {
    raw: String,
    source: ParamSource,
    path: Vec<String>,
}

impl ParamExpr {
    pub fn parse(expression: &str) -> Result<Self, ResolveError> {
        let mut parts = expression.split(PATH_SEPARATOR);
        let source_name = parts.next().unwrap_or_default();
        let path: Vec<String> = parts.map(str::to_string).collect();

        if path.is_empty() {
            return Err(ResolveError::Malformed { expression: expression.to_string() });
        }
        let source = match source_name {
            SOURCE_PAYLOAD => ParamSource::Payload,
            SOURCE_RESULTS => ParamSource::Results,
            other => {
                return Err(ResolveError::InvalidSource { expression: expression.to_string(),
                                                         source_name: other.to_string() })
            }
        };
        // "payload..a" o "payload.a." no son rutas recorribles
        if path.iter().any(|seg| seg.is_empty()) {
            return Err(ResolveError::Malformed { expression: expression.to_string() });
        }
        Ok(Self { raw: expression.to_string(),
                  source,
                  path })
    }

    pub fn source(&self) -> ParamSource {
        self.source
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Primer segmento de la ruta: para `results.*` es el `resultKey`.
    pub fn root_key(&self) -> &str {
        &self.path[0]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Recorre la ruta sobre un mapa raíz (payload o resultados). Devuelve el
    /// primer segmento ausente en caso de fallo.
    pub fn lookup<'v>(&self, root: &'v Map<String, Value>) -> Result<&'v Value, &str> {
        let first = root.get(self.root_key()).ok_or(self.root_key())?;
        descend(first, &self.path[1..])
    }

    /// Igual que `lookup` pero partiendo de un `Value` arbitrario.
    pub fn walk<'v>(&self, root: &'v Value) -> Result<&'v Value, &str> {
        descend(root, &self.path)
    }
}

/// Los arreglos se indexan con segmentos numéricos.
fn descend<'v, 's>(start: &'v Value, segments: &'s [String]) -> Result<&'v Value, &'s str> {
    let mut current = start;
    for seg in segments {
        let next = match current {
            Value::Object(map) => map.get(seg.as_str()),
            Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => return Err(seg.as_str()),
        }
    }
    Ok(current)
}

impl FromStr for ParamExpr {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ParamExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_source_and_path() {
        let e: ParamExpr = "results.enrollmentResult.studentId".parse().expect("valid");
        assert_eq!(e.source(), ParamSource::Results);
        assert_eq!(e.root_key(), "enrollmentResult");
        assert_eq!(e.path().len(), 2);
    }

    #[test]
    fn rejects_unknown_source_and_missing_path() {
        assert!(matches!(ParamExpr::parse("form.a"), Err(ResolveError::InvalidSource { .. })));
        assert!(matches!(ParamExpr::parse("payload"), Err(ResolveError::Malformed { .. })));
        assert!(matches!(ParamExpr::parse("payload..a"), Err(ResolveError::Malformed { .. })));
        assert!(matches!(ParamExpr::parse(""), Err(ResolveError::Malformed { .. })));
    }

    #[test]
    fn walk_reports_first_missing_segment() {
        let e = ParamExpr::parse("payload.a.b.c").expect("valid");
        let root = json!({"a": {"b": 1}});
        assert_eq!(e.walk(&root), Err("c"));
        let e = ParamExpr::parse("payload.items.1.id").expect("valid");
        let root = json!({"items": [{"id": "x"}, {"id": "y"}]});
        assert_eq!(e.walk(&root), Ok(&json!("y")));
    }
}
