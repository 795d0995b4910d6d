//! Catálogo académico y flujos de demostración.
//!
//! Facultades -> carreras -> niveles como consultas de catálogo en cascada,
//! y la cadena de inscripción + asignación de curso por defecto.

use std::sync::Arc;

use chrono::Utc;
use flow_core::model::Params;
use flow_core::{EngineError, InMemoryFlowRepository, InvokeError, ParamType, QueryParameter};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::catalog::{CustomQuery, QueryCatalog};
use crate::config::InvokerConfig;
use crate::invoker::CatalogQueryInvoker;

pub const DEMO_FLOWS_JSON: &str = include_str!("../data/demo_flows.json");

const KNOWN_CAREERS: [&str; 6] = ["bio", "chem", "mech", "elec", "hist", "lit"];

pub fn academic_queries() -> Vec<CustomQuery> {
    let s = |key: &str, label: &str| QueryParameter { key: key.to_string(),
                                                      label: label.to_string(),
                                                      param_type: ParamType::String,
                                                      required: true };
    vec![CustomQuery::new("GET_FACULTIES").describe("Retrieves a list of all available faculties.")
                                          .catalog()
                                          .locked(),
         CustomQuery::new("GET_CAREERS_BY_FACULTY").describe("Retrieves careers for a given faculty.")
                                                   .catalog()
                                                   .param(s("facultyId", "Faculty ID")),
         CustomQuery::new("GET_LEVELS_BY_CAREER").describe("Retrieves academic levels for a given career.")
                                                 .catalog()
                                                 .param(s("careerId", "Career ID")),
         CustomQuery::new("FINAL_STUDENT_ENROLLMENT").describe("Enrolls a student and returns their new ID.")
                                                     .param(s("faculty", "Faculty"))
                                                     .param(s("career", "Career"))
                                                     .param(s("level", "Level"))
                                                     .param(s("student_name", "Student Name"))
                                                     .param(s("student_email", "Student Email")),
         CustomQuery::new("ASSIGN_DEFAULT_COURSE").describe("Assigns a default course to a newly enrolled student.")
                                                  .param(s("studentId", "Student ID"))]
}

fn options(pairs: &[(&str, &str)]) -> Value {
    Value::Array(pairs.iter()
                      .map(|(value, label)| json!({"value": value, "label": label}))
                      .collect())
}

fn str_param<'a>(params: &'a Params, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or_default()
}

pub fn get_faculties(_params: &Params) -> Result<Value, InvokeError> {
    Ok(options(&[("sci", "Science"), ("art", "Arts"), ("eng", "Engineering")]))
}

pub fn get_careers_by_faculty(params: &Params) -> Result<Value, InvokeError> {
    let careers = match str_param(params, "facultyId") {
        "sci" => options(&[("bio", "Biology"), ("chem", "Chemistry")]),
        "eng" => options(&[("mech", "Mechanical Engineering"), ("elec", "Electrical Engineering")]),
        "art" => options(&[("hist", "History"), ("lit", "Literature")]),
        _ => Value::Array(vec![]),
    };
    Ok(careers)
}

pub fn get_levels_by_career(params: &Params) -> Result<Value, InvokeError> {
    if KNOWN_CAREERS.contains(&str_param(params, "careerId")) {
        Ok(options(&[("100", "100 Level"), ("200", "200 Level"), ("300", "300 Level"), ("400", "400 Level")]))
    } else {
        Ok(Value::Array(vec![]))
    }
}

pub fn final_student_enrollment(params: &Params) -> Result<Value, InvokeError> {
    let student = (Uuid::new_v4().as_u128() % 10_000) as u32;
    Ok(json!({
        "success": true,
        "message": format!("Student {} enrolled successfully!", str_param(params, "student_name")),
        "enrollmentId": format!("ENRL-{}", Utc::now().timestamp_millis()),
        "studentId": format!("STU-{student}"),
    }))
}

pub fn assign_default_course(params: &Params) -> Result<Value, InvokeError> {
    let student_id = str_param(params, "studentId");
    if student_id.is_empty() {
        return Err(InvokeError::Backend("studentId is required for ASSIGN_DEFAULT_COURSE.".to_string()));
    }
    Ok(json!({
        "success": true,
        "message": format!("Default course 'INTRO-101' assigned to student {student_id}."),
        "courseAssignmentId": format!("CAS-{}", Utc::now().timestamp_millis()),
    }))
}

/// Registra los handlers académicos en `invoker`.
pub fn register_academic_handlers(invoker: &CatalogQueryInvoker) {
    invoker.register("GET_FACULTIES", get_faculties);
    invoker.register("GET_CAREERS_BY_FACULTY", get_careers_by_faculty);
    invoker.register("GET_LEVELS_BY_CAREER", get_levels_by_career);
    invoker.register("FINAL_STUDENT_ENROLLMENT", final_student_enrollment);
    invoker.register("ASSIGN_DEFAULT_COURSE", assign_default_course);
}

/// Invoker con el catálogo académico completo.
pub fn demo_invoker(config: InvokerConfig) -> CatalogQueryInvoker {
    let invoker = CatalogQueryInvoker::new(Arc::new(QueryCatalog::with_queries(academic_queries())), config);
    register_academic_handlers(&invoker);
    invoker
}

/// Repositorio con los grupos de demostración.
pub fn demo_repository() -> Result<InMemoryFlowRepository, EngineError> {
    InMemoryFlowRepository::from_json_str(DEMO_FLOWS_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::FlowRepository;

    fn p(v: Value) -> Params {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn careers_depend_on_faculty() {
        let v = get_careers_by_faculty(&p(json!({"facultyId": "eng"}))).unwrap();
        assert_eq!(v[0]["value"], json!("mech"));
        assert_eq!(get_careers_by_faculty(&p(json!({"facultyId": "x"}))).unwrap(), json!([]));
    }

    #[test]
    fn levels_only_for_known_careers() {
        assert_eq!(get_levels_by_career(&p(json!({"careerId": "lit"}))).unwrap().as_array().map(Vec::len), Some(4));
        assert_eq!(get_levels_by_career(&p(json!({"careerId": "??"}))).unwrap(), json!([]));
    }

    #[test]
    fn enrollment_returns_student_id() {
        let v = final_student_enrollment(&p(json!({"student_name": "Ada"}))).unwrap();
        assert!(v["studentId"].as_str().unwrap().starts_with("STU-"));
        assert_eq!(v["message"], json!("Student Ada enrolled successfully!"));
    }

    #[test]
    fn demo_repository_has_three_groups() {
        let repo = demo_repository().unwrap();
        assert_eq!(repo.categories(), vec!["Human Resources", "Academics", "IT Support"]);
        assert!(repo.flows_in("IT Support").is_empty());
        let enrollment = repo.find("student-enrollment").unwrap();
        assert_eq!(enrollment.steps[1].query_chain.len(), 2);
        assert!(repo.find("leave-request").unwrap().locked);
    }
}
