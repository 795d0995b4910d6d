mod common;

use std::sync::Arc;

use common::{engine_for, ScriptedInvoker};
use flow_core::{AdvanceRequest, FieldType, FlowDefinition, FlowStep, FormField};
use serde_json::{json, Value};

fn program_flow() -> FlowDefinition {
    FlowDefinition::new("program", "Program")
        .step(FlowStep::new("pick").field(FormField::new("faculty", FieldType::Select).query("FACULTIES"))
                                   .field(FormField::new("career", FieldType::Select).query("CAREERS").depends_on("faculty")))
        .step(FlowStep::new("confirm"))
}

fn catalog() -> Arc<ScriptedInvoker> {
    Arc::new(ScriptedInvoker::new().ok("FACULTIES", json!([{"value": "sci", "label": "Science"}]))
                                   .ok("CAREERS", json!([{"value": "bio", "label": "Biology"}])))
}

#[tokio::test]
async fn dependency_change_resets_then_reloads() {
    let inv = catalog();
    let mut engine = engine_for(vec![program_flow()], inv.clone());
    engine.start_flow("program").unwrap();

    let mut cascade = engine.cascade_for_current_step().expect("ready step");
    cascade.initialize().await;
    assert!(cascade.is_disabled("career"));
    assert_eq!(inv.call_names(), vec!["FACULTIES"]);

    cascade.change_value("faculty", json!("sci")).await;
    cascade.change_value("career", json!("bio")).await;
    assert_eq!(cascade.options("career").len(), 1);

    let requests = cascade.set_value("faculty", json!("eng"));
    assert_eq!(cascade.value("career"), Some(&Value::Null));
    assert!(cascade.options("career").is_empty());
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].field_key, "career");

    let calls_before = inv.calls().len();
    let requests = cascade.set_value("faculty", json!(""));
    assert!(requests.is_empty());
    assert!(cascade.options("career").is_empty());
    assert!(cascade.is_disabled("career"));
    assert_eq!(inv.calls().len(), calls_before);
}

#[tokio::test]
async fn reentering_a_step_prefills_and_loads_dependents() {
    let inv = catalog();
    let mut engine = engine_for(vec![program_flow()], inv.clone());
    engine.start_flow("program").unwrap();

    let mut cascade = engine.cascade_for_current_step().unwrap();
    cascade.initialize().await;
    cascade.change_value("faculty", json!("sci")).await;
    cascade.change_value("career", json!("bio")).await;
    engine.advance_flow(AdvanceRequest::new("program", "pick", cascade.values()))
          .await
          .unwrap();
    assert!(engine.regress_flow("program"));

    let mut again = engine.cascade_for_current_step().unwrap();
    assert_eq!(again.value("career"), Some(&json!("bio")));
    assert!(!again.is_disabled("career"));
    again.initialize().await;
    assert_eq!(again.options("career").len(), 1);

    // la carga del dependiente liga el valor del padre al parámetro
    let last = inv.calls().pop().unwrap();
    assert_eq!(last, ("CAREERS".to_string(), json!({"faculty": "sci"})));
}
