//! Coded-value extraction and local membership for terminology bindings.

use crate::types::{BindingInfo, Element, Value};

/// A `(code, system)` pair contributed by a bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedValue {
    pub code: String,
    pub system: Option<String>,
}

/// Codes carried by `value`. A CodeableConcept contributes one pair per coding
/// and conforms when any of them does.
pub fn coded_values(value: &Value) -> Vec<CodedValue> {
    match value {
        Value::Primitive(primitive) => primitive
            .as_str()
            .map(|code| CodedValue {
                code: code.to_string(),
                system: None,
            })
            .into_iter()
            .collect(),
        Value::Element(element) => match element.type_name() {
            "Coding" | "Quantity" => coded_pair(element).into_iter().collect(),
            "CodeableConcept" => element
                .values("coding")
                .iter()
                .filter_map(Value::as_element)
                .filter_map(coded_pair)
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn coded_pair(element: &Element) -> Option<CodedValue> {
    let code = element.value("code").and_then(Value::as_str)?;
    Some(CodedValue {
        code: code.to_string(),
        system: element
            .value("system")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Membership against the codes enumerated on the binding itself.
pub fn is_enumerated_member(binding: &BindingInfo, candidates: &[CodedValue]) -> bool {
    candidates.iter().any(|candidate| {
        let system_matches = match (&binding.system, &candidate.system) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        };
        system_matches && binding.codes.iter().any(|code| *code == candidate.code)
    })
}

pub fn describe(candidates: &[CodedValue]) -> String {
    let parts: Vec<String> = candidates
        .iter()
        .map(|candidate| match &candidate.system {
            Some(system) => format!("{}#{}", system, candidate.code),
            None => candidate.code.clone(),
        })
        .collect();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;
    use crate::types::Primitive;

    #[test]
    fn test_codeable_concept_contributes_every_coding() {
        let registry = SchemaRegistry::with_core_definitions().unwrap();
        let coding = |system: &str, code: &str| {
            let mut b = registry.builder("Coding").unwrap();
            b.set_uri("system", system).unwrap();
            b.set_code("code", code).unwrap();
            b.build()
        };
        let mut concept = registry.builder("CodeableConcept").unwrap();
        concept.add("coding", coding("http://a", "1")).unwrap();
        concept.add("coding", coding("http://b", "2")).unwrap();
        concept.set_string("text", "free text").unwrap();

        let values = coded_values(&Value::Element(concept.build()));
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].system.as_deref(), Some("http://b"));
    }

    #[test]
    fn test_enumerated_membership() {
        let binding = BindingInfo::required("http://hl7.org/fhir/ValueSet/publication-status")
            .with_codes(
                "http://hl7.org/fhir/publication-status",
                &["draft", "active", "retired", "unknown"],
            );

        let code = coded_values(&Value::Primitive(Primitive::code("active")));
        assert!(is_enumerated_member(&binding, &code));

        let wrong = coded_values(&Value::Primitive(Primitive::code("final")));
        assert!(!is_enumerated_member(&binding, &wrong));

        let wrong_system = vec![CodedValue {
            code: "active".into(),
            system: Some("http://other".into()),
        }];
        assert!(!is_enumerated_member(&binding, &wrong_system));
        assert_eq!(describe(&wrong_system), "http://other#active");
    }
}
