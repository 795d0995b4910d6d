//! Recorrido de demostración del motor sobre el catálogo académico:
//! cascada facultad -> carrera -> nivel, cadena de inscripción y un par de
//! casos de error.
use std::io::Write;

use formflow::app::{build_engine, init_logging};
use formflow::config::CONFIG;
use formflow::errors::AppError;
use flow_adapters::demo::academic_queries;
use flow_adapters::QueryCatalog;
use flow_core::{AdvanceRequest, FlowRepository};
use log::{error, info};
use serde_json::json;

const ENROLLMENT: &str = "student-enrollment";

async fn run() -> Result<(), AppError> {
    let mut engine = build_engine(&CONFIG)?;
    let mut out = std::io::stdout();

    writeln!(out, "=== FormFlow demo ===")?;
    for category in engine.repository().categories() {
        let ids: Vec<String> = engine.repository().flows_in(category).iter().map(|f| f.id.clone()).collect();
        writeln!(out, "{category}: {ids:?}")?;
    }

    // flujo inexistente: la sesión queda en error y se puede reiniciar
    if let Err(e) = engine.start_flow("does-not-exist") {
        writeln!(out, "start_flow rechazado: {e} -> {:?}", engine.state().error_message())?;
    }

    engine.start_flow(ENROLLMENT)?;
    info!("session {} on {}", engine.session_id(), ENROLLMENT);

    // Step 1: selección en cascada
    let mut cascade = engine.cascade_for_current_step().ok_or(flow_core::EngineError::NoActiveSession)?;
    cascade.initialize().await;
    writeln!(out, "faculties: {:?}", cascade.options("faculty").iter().map(|o| &o.label).collect::<Vec<_>>())?;
    cascade.change_value("faculty", json!("sci")).await;
    writeln!(out, "careers(sci): {:?}", cascade.options("career").iter().map(|o| &o.label).collect::<Vec<_>>())?;
    cascade.change_value("career", json!("chem")).await;
    cascade.change_value("level", json!("200")).await;

    // cambiar la facultad invalida carrera y nivel
    cascade.change_value("faculty", json!("eng")).await;
    writeln!(out,
             "after faculty=eng: career={} level_disabled={}",
             cascade.value("career").cloned().unwrap_or_default(),
             cascade.is_disabled("level"))?;
    cascade.change_value("career", json!("mech")).await;
    cascade.change_value("level", json!("100")).await;

    engine.advance_flow(AdvanceRequest::new(ENROLLMENT, "program-selection", cascade.values()))
          .await?;

    // volver atrás no re-ejecuta nada; el payload se conserva
    engine.regress_flow(ENROLLMENT);
    let prefilled = engine.cascade_for_current_step().and_then(|c| c.value("career").cloned());
    writeln!(out, "regressed, career pre-filled: {prefilled:?}")?;
    let values = engine.cascade_for_current_step()
                       .map(|c| c.values())
                       .unwrap_or_default();
    engine.advance_flow(AdvanceRequest::new(ENROLLMENT, "program-selection", values))
          .await?;

    // Step 2: la cadena de inscripción + asignación de curso
    let details = json!({"student_name": "Ada Lovelace", "student_email": "ada@uni.edu"});
    let result = engine.session().submit_json(details).await;
    if let Err(e) = &result {
        error!("enrollment failed: {e}");
    }

    writeln!(out, "final state:")?;
    serde_json::to_writer_pretty(&mut out, engine.state())?;
    writeln!(out)?;
    writeln!(out, "events: {}", engine.event_variants().join(""))?;

    let locked = engine.repository().find("leave-request").map(|f| f.locked).unwrap_or(false);
    writeln!(out, "leave-request locked: {locked}")?;

    // mantenimiento del catálogo: las consultas bloqueadas no se borran
    let catalog = QueryCatalog::with_queries(academic_queries());
    if let Err(e) = catalog.delete("GET_FACULTIES") {
        writeln!(out, "catalog: {e}")?;
    }
    catalog.toggle_lock("GET_FACULTIES")?;
    catalog.delete("GET_FACULTIES")?;
    writeln!(out, "catalog after unlock+delete: {} queries", catalog.len())?;
    result.map_err(AppError::from)
}

#[tokio::main]
async fn main() {
    init_logging(&CONFIG);
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
