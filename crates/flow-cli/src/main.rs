use std::sync::Arc;

use flow_adapters::{demo_invoker, demo_repository, InvokerConfig};
use flow_core::{AdvanceRequest, EngineConfig, FlowEngine, FlowRepository, FlowStatus, InMemoryEventStore,
                InMemoryFlowRepository, OptionsLoader, QueryInvoker, ResolutionPolicy};
use log::{info, warn};
use serde_json::Value;

const USAGE: &str = "Uso:
  flow list [--flows <PATH>]
  flow run --flow <ID> --inputs '<JSON array>' [--flows <PATH>] [--lenient]
  flow options --query <NAME> [--parent <KEY> --value <V>]
  flow catalog";

/// Argumentos `--clave valor` a partir de `args[2..]`; los flags sin valor
/// quedan con cadena vacía.
fn parse_flags(args: &[String]) -> Vec<(String, String)> {
    let mut out = vec![];
    let mut i = 2;
    while i < args.len() {
        if let Some(name) = args[i].strip_prefix("--") {
            let value = match args.get(i + 1) {
                Some(v) if !v.starts_with("--") => {
                    i += 1;
                    v.clone()
                }
                _ => String::new(),
            };
            out.push((name.to_string(), value));
        }
        i += 1;
    }
    out
}

fn flag<'a>(flags: &'a [(String, String)], name: &str) -> Option<&'a str> {
    flags.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

fn init_logging() {
    let fallback = std::env::var("FLOW_LOG").unwrap_or_else(|_| "warn".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env()
                                                          .or_else(|_| tracing_subscriber::EnvFilter::try_new(&fallback))
                                                          .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")))
                                     .with_target(false)
                                     .try_init();
}

fn load_repository(flags: &[(String, String)]) -> InMemoryFlowRepository {
    let loaded = match flag(flags, "flows") {
        Some(path) if !path.is_empty() => {
            info!("loading flow definitions from {path}");
            InMemoryFlowRepository::from_json_file(path)
        }
        _ => demo_repository(),
    };
    match loaded {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("[flow] no se pudieron cargar los flujos: {e}");
            std::process::exit(3);
        }
    }
}

fn cmd_list(flags: &[(String, String)]) {
    let repo = load_repository(flags);
    for category in repo.categories() {
        println!("{category}");
        for f in repo.flows_in(category) {
            let lock = if f.locked { " [locked]" } else { "" };
            println!("  {:<24} {} ({} steps){lock}", f.id, f.name, f.len());
        }
    }
}

fn cmd_catalog() {
    let invoker = demo_invoker(InvokerConfig::from_env());
    for q in invoker.catalog().list() {
        let params: Vec<String> = q.parameters
                                   .iter()
                                   .map(|p| format!("{}{}", p.key, if p.required { "*" } else { "" }))
                                   .collect();
        println!("{:<28} catalog={:<5} locked={:<5} params=[{}]", q.name, q.is_catalog, q.locked, params.join(", "));
    }
}

async fn cmd_options(flags: &[(String, String)]) {
    let Some(query) = flag(flags, "query").filter(|q| !q.is_empty()) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let invoker: Arc<dyn QueryInvoker> = Arc::new(demo_invoker(InvokerConfig::from_env()));
    let loader = OptionsLoader::new(invoker);
    let value = flag(flags, "value").map(|v| Value::String(v.to_string()));
    match loader.fetch_options(query, flag(flags, "parent"), value.as_ref()).await {
        Ok(options) => {
            for o in options {
                println!("{}\t{}", o.value, o.label);
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(5);
        }
    }
}

async fn cmd_run(flags: &[(String, String)]) {
    let (Some(flow_id), Some(raw_inputs)) = (flag(flags, "flow"), flag(flags, "inputs")) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let inputs: Vec<Value> = match serde_json::from_str(raw_inputs) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("[flow run] inputs JSON parse error: {e}");
            std::process::exit(3);
        }
    };

    let repo = load_repository(flags);
    let mut config = EngineConfig::from_env();
    if flag(flags, "lenient").is_some() {
        config = config.with_resolution(ResolutionPolicy::Lenient);
    }
    if repo.find(flow_id).is_none() {
        eprintln!("[flow run] flujo no encontrado: {flow_id}");
        std::process::exit(4);
    }
    let mut engine = FlowEngine::builder(InMemoryEventStore::default(), repo).invoker(Arc::new(demo_invoker(InvokerConfig::from_env())))
                                                                             .config(config)
                                                                             .build();
    info!("running flow {flow_id} with {} input(s)", inputs.len());
    if let Err(e) = engine.start_flow(flow_id) {
        eprintln!("error: {e}");
        std::process::exit(4);
    }

    for input in inputs {
        let Some(step) = engine.state().current_step().cloned() else {
            break;
        };
        let payload = match input {
            Value::Object(m) => m,
            other => {
                eprintln!("[flow run] cada input debe ser un objeto JSON, recibido: {other}");
                std::process::exit(3);
            }
        };
        println!("-> {} ({})", step.title, step.id);
        if let Err(e) = engine.advance_flow(AdvanceRequest::new(flow_id, step.id.clone(), payload)).await {
            warn!("advance_flow failed on step {}: {e}", step.id);
            break;
        }
    }

    let state = engine.state();
    match &state.status {
        FlowStatus::Ready { current_step, current_step_index } => {
            println!("ready en step {current_step_index} ({}): faltan inputs", current_step.id)
        }
        FlowStatus::Completed => println!("completed"),
        FlowStatus::FinalResult { final_query_result } => {
            println!("final-result:");
            for (k, v) in final_query_result.as_map() {
                println!("  {k}: {v}");
            }
        }
        FlowStatus::Error { message } => println!("error: {message}"),
        FlowStatus::Loading => println!("loading"),
    }
    println!("eventos: {}", engine.event_variants().join(""));
    if state.error_message().is_some() {
        std::process::exit(5);
    }
}

#[tokio::main]
async fn main() {
    // Cargar .env si existe
    let _ = dotenvy::dotenv();
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let flags = parse_flags(&args);
    match args.get(1).map(String::as_str) {
        Some("list") => cmd_list(&flags),
        Some("catalog") => cmd_catalog(),
        Some("options") => cmd_options(&flags).await,
        Some("run") => cmd_run(&flags).await,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_valued_and_bare_flags() {
        let flags = parse_flags(&args(&["flow", "run", "--flow", "x", "--lenient", "--inputs", "[]"]));
        assert_eq!(flag(&flags, "flow"), Some("x"));
        assert_eq!(flag(&flags, "lenient"), Some(""));
        assert_eq!(flag(&flags, "inputs"), Some("[]"));
        assert_eq!(flag(&flags, "missing"), None);
    }
}
