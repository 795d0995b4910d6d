use std::sync::Arc;

use flow_adapters::{demo_invoker, demo_repository, InvokerConfig};
use flow_core::{AdvanceRequest, EngineConfig, FlowEngine, FlowStatus, InMemoryEventStore, OptionsLoader, QueryInvoker};
use serde_json::json;

#[tokio::test]
async fn fetch_options_binds_dependency_to_declared_parameter() {
    let invoker: Arc<dyn QueryInvoker> = Arc::new(demo_invoker(InvokerConfig::default()));
    let loader = OptionsLoader::new(invoker);

    let careers = loader.fetch_options("GET_CAREERS_BY_FACULTY", Some("faculty"), Some(&json!("sci")))
                        .await
                        .unwrap();
    let values: Vec<_> = careers.iter().map(|o| o.value.clone()).collect();
    assert_eq!(values, vec![json!("bio"), json!("chem")]);

    // sin valor de dependencia el parámetro requerido falta
    let err = loader.fetch_options("GET_CAREERS_BY_FACULTY", None, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing required parameter: \"facultyId\" for query \"GET_CAREERS_BY_FACULTY\".");
}

#[tokio::test]
async fn program_selection_cascade_over_demo_catalog() {
    let repo = demo_repository().unwrap();
    let mut engine = FlowEngine::builder(InMemoryEventStore::default(), repo).invoker(Arc::new(demo_invoker(InvokerConfig::default())))
                                                                             .config(EngineConfig::default())
                                                                             .build();
    engine.start_flow("student-enrollment").unwrap();

    let mut cascade = engine.cascade_for_current_step().unwrap();
    cascade.initialize().await;
    assert_eq!(cascade.options("faculty").len(), 3);
    assert!(cascade.is_disabled("career") && cascade.is_disabled("level"));

    cascade.change_value("faculty", json!("art")).await;
    cascade.change_value("career", json!("hist")).await;
    assert_eq!(cascade.options("level").len(), 4);

    cascade.change_value("faculty", json!("eng")).await;
    assert_eq!(cascade.options("career")[0].value, json!("mech"));
    assert!(cascade.is_disabled("level"));
    assert!(cascade.options("level").is_empty());

    cascade.change_value("career", json!("elec")).await;
    cascade.change_value("level", json!("300")).await;
    engine.advance_flow(AdvanceRequest::new("student-enrollment", "program-selection", cascade.values()))
          .await
          .unwrap();
    assert_eq!(engine.state().current_step_index(), Some(1));

    engine.advance_flow(AdvanceRequest::new("student-enrollment",
                                            "student-details",
                                            json!({"student_name": "Ada", "student_email": "ada@uni.edu"}).as_object()
                                                                                                          .cloned()
                                                                                                          .unwrap()))
          .await
          .unwrap();
    match &engine.state().status {
        FlowStatus::FinalResult { final_query_result } => {
            let student = final_query_result.get("enrollmentResult").unwrap()["studentId"].as_str().unwrap().to_string();
            let msg = final_query_result.get("courseAssignmentResult").unwrap()["message"].as_str().unwrap();
            assert!(msg.ends_with(&format!("student {student}.")));
        }
        other => panic!("unexpected status {other:?}"),
    }
}
