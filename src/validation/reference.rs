//! Structural check of declared reference targets.

use super::IssueCode;
use crate::reference::parse_reference;
use crate::types::{Element, FieldDescriptor, RESOURCE_KIND, Value};

/// Check one Reference value against the field's allowed target types.
///
/// The declared type comes from `Reference.type` and from relative or
/// conditional literals; contained and absolute literals carry none.
pub fn check_reference_target(
    reference: &Element,
    field: &FieldDescriptor,
) -> Option<(IssueCode, String)> {
    let targets = &field.target_types;
    if targets.is_empty() || targets.iter().any(|t| t == RESOURCE_KIND) {
        return None;
    }

    let not_allowed = || {
        (
            IssueCode::ReferenceType,
            format!(
                "{} must reference a resource of type {}",
                field.name,
                targets.join(", ")
            ),
        )
    };

    let literal = reference.value("reference").and_then(Value::as_str);
    let mut literal_type = None;
    if let Some(literal) = literal {
        match parse_reference(literal) {
            Ok(parsed) => literal_type = parsed.resource_type,
            Err(_) => {
                return Some((
                    IssueCode::InvalidReference,
                    format!(
                        "Invalid reference value or resource type not found in reference value: '{}' for element: '{}'",
                        literal, field.name
                    ),
                ));
            }
        }
        if let Some(resource_type) = &literal_type {
            if !targets.contains(resource_type) {
                return Some(not_allowed());
            }
        }
    }

    if let Some(declared) = reference.value("type").and_then(Value::as_str) {
        if !targets.iter().any(|t| t == declared) {
            return Some(not_allowed());
        }
        if let Some(resource_type) = &literal_type {
            if resource_type != declared {
                return Some((
                    IssueCode::ReferenceType,
                    format!(
                        "Resource type found in reference value: '{}' for element: '{}' does not match Reference.type: {}",
                        literal.unwrap_or_default(),
                        field.name,
                        declared
                    ),
                ));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;

    fn reference(literal: Option<&str>, declared: Option<&str>) -> Element {
        let registry = SchemaRegistry::with_core_definitions().unwrap();
        let mut builder = registry.builder("Reference").unwrap();
        if let Some(literal) = literal {
            builder.set_string("reference", literal).unwrap();
        }
        if let Some(declared) = declared {
            builder.set_uri("type", declared).unwrap();
        }
        builder.build()
    }

    fn patient_field() -> FieldDescriptor {
        FieldDescriptor::new(
            "patient",
            crate::types::Cardinality::RequiredSingle,
            "Reference",
        )
        .with_targets(&["Patient"])
    }

    #[test]
    fn test_allowed_literal() {
        assert!(check_reference_target(&reference(Some("Patient/1"), None), &patient_field()).is_none());
        assert!(check_reference_target(&reference(Some("#p1"), None), &patient_field()).is_none());
        assert!(
            check_reference_target(
                &reference(Some("http://example.org/fhir/Group/1"), None),
                &patient_field()
            )
            .is_none()
        );
    }

    #[test]
    fn test_disallowed_literal() {
        let (code, message) =
            check_reference_target(&reference(Some("Group/1"), None), &patient_field()).unwrap();
        assert_eq!(code, IssueCode::ReferenceType);
        assert_eq!(message, "patient must reference a resource of type Patient");
    }

    #[test]
    fn test_declared_type() {
        let (code, _) =
            check_reference_target(&reference(None, Some("Group")), &patient_field()).unwrap();
        assert_eq!(code, IssueCode::ReferenceType);

        let field = FieldDescriptor::new(
            "subject",
            crate::types::Cardinality::OptionalSingle,
            "Reference",
        )
        .with_targets(&["Patient", "Group"]);
        let (_, message) =
            check_reference_target(&reference(Some("Patient/1"), Some("Group")), &field).unwrap();
        assert!(message.contains("does not match Reference.type: Group"));
    }

    #[test]
    fn test_unparseable_literal() {
        let (code, _) =
            check_reference_target(&reference(Some("patient one"), None), &patient_field())
                .unwrap();
        assert_eq!(code, IssueCode::InvalidReference);
    }
}
