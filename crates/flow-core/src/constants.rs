//! Constantes del motor de ejecución de flujos.
//!
//! Agrupa los prefijos del lenguaje de expresiones de parámetros y los
//! mensajes estables que la capa de UI muestra en el estado `error`.

/// Versión lógica del motor. Se anota en el evento `SessionStarted` para poder
/// distinguir sesiones registradas por versiones incompatibles.
pub const ENGINE_VERSION: &str = "FE1.0";

/// Prefijo de expresión que lee del payload acumulado.
pub const SOURCE_PAYLOAD: &str = "payload";

/// Prefijo de expresión que lee del contexto de resultados de la cadena.
pub const SOURCE_RESULTS: &str = "results";

/// Separador de segmentos en las expresiones `source.path`.
pub const PATH_SEPARATOR: char = '.';

pub const MSG_FLOW_NOT_FOUND_OR_EMPTY: &str = "Flow not found or has no steps.";
