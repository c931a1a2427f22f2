mod common;

use common::*;
use octofhir_fhirelement::*;

#[test]
fn test_compose_with_include_is_valid() {
    let registry = registry();
    let compose = create_compose(&registry);

    let result = Validator::default().validate(&compose);
    assert!(result.is_valid);
    assert_eq!(result.rule_count, 0);
}

#[test]
fn test_compose_without_include_has_one_violation() {
    let registry = registry();
    let compose = create_compose(&registry);

    let mut builder = compose.to_builder();
    builder.clear("include").unwrap();
    let result = Validator::default().validate(&builder.build());

    let violations: Vec<_> = result.rule_violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, "compose.include");
    assert_eq!(violations[0].code, IssueCode::Required);
    assert_eq!(violations[0].message, "include must be present");
}

#[test]
fn test_required_single_detected_and_cleared() {
    let registry = registry();
    let mut concept = registry.builder("ValueSet.Compose.Include.Concept").unwrap();
    concept.set_string("display", "Alpha").unwrap();

    let validator = Validator::default();
    let result = validator.validate(&concept.clone().build());
    let violations: Vec<_> = result.rule_violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, "concept.code");

    concept.set_code("code", "A").unwrap();
    assert!(validator.validate(&concept.build()).is_valid);
}

#[test]
fn test_empty_nonempty_list_is_violation() {
    let registry = registry();
    let mut compose = registry.builder("ValueSet.Compose").unwrap();
    compose.add_all("include", Vec::<Element>::new()).unwrap();
    let validator = Validator::default();
    assert_eq!(validator.validate(&compose.clone().build()).rule_count, 1);

    compose
        .add("include", create_include(&registry, "http://x/codes", &[]))
        .unwrap();
    assert!(validator.validate(&compose.build()).is_valid);
}

#[test]
fn test_nested_violation_path() {
    let registry = registry();
    let mut include = registry.builder("ValueSet.Compose.Include").unwrap();
    include.set_uri("system", "http://x/codes").unwrap();
    include
        .add(
            "concept",
            registry
                .builder("ValueSet.Compose.Include.Concept")
                .unwrap()
                .build(),
        )
        .unwrap();
    let mut compose = registry.builder("ValueSet.Compose").unwrap();
    compose.add("include", include.build()).unwrap();

    let result = Validator::default().validate(&compose.build());
    let paths: Vec<&str> = result.rule_violations().map(|i| i.path.as_str()).collect();
    // the empty concept reports its missing code, not ele-1
    assert_eq!(paths, ["compose.include.concept.code"]);
}

#[test]
fn test_vision_prescription_is_valid() {
    let registry = registry();
    let prescription = create_vision_prescription(&registry, "Patient/example");

    let result = Validator::default().validate(&prescription);
    assert!(result.is_valid, "{:?}", result.issues);
}

#[test]
fn test_patient_reference_target() {
    let registry = registry();
    let prescription = create_vision_prescription(&registry, "Group/1");

    let result = Validator::default().validate(&prescription);
    let violations: Vec<_> = result.rule_violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].path, "VisionPrescription.patient");
    assert_eq!(violations[0].code, IssueCode::ReferenceType);
    assert_eq!(
        violations[0].message,
        "patient must reference a resource of type Patient"
    );

    let unchecked = Validator::new(ModelConfig::default().with_reference_checks(false));
    assert!(unchecked.validate(&prescription).is_valid);
}

#[test]
fn test_prescriber_allows_either_target() {
    let registry = registry();
    let mut builder = create_vision_prescription(&registry, "Patient/1").to_builder();
    builder
        .set("prescriber", create_reference(&registry, "PractitionerRole/7"))
        .unwrap();
    assert!(Validator::default().validate(&builder.build()).is_valid);
}

#[test]
fn test_enumerated_code_violation() {
    let registry = registry();
    let mut builder = create_vision_prescription(&registry, "Patient/1").to_builder();
    builder
        .add_all(
            "lensSpecification",
            [create_lens(&registry, "right"), create_lens(&registry, "both")],
        )
        .unwrap();

    let result = Validator::default().validate(&builder.build());
    let violations: Vec<_> = result.rule_violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, IssueCode::Binding);
    assert_eq!(violations[0].path, "VisionPrescription.lensSpecification.eye");
}

#[test]
fn test_example_binding_opt_in() {
    let registry = registry();
    let prescription = create_vision_prescription(&registry, "Patient/1");

    let result = Validator::default().validate(&prescription);
    assert!(result.issues.is_empty());

    let result = Validator::new(ModelConfig::default().with_example_bindings(true))
        .validate(&prescription);
    assert!(result.is_valid);
    assert_eq!(result.info_count, 2);
    assert!(
        result
            .issues
            .iter()
            .all(|issue| issue.code == IssueCode::BindingNotChecked
                && issue.severity == Severity::Information)
    );
}

#[test]
fn test_required_pending_binding_warns_without_service() {
    let registry = registry();
    let mut value_set = create_value_set(&registry).to_builder();
    let mut coding = registry.builder("Coding").unwrap();
    coding.set_uri("system", "urn:iso:std:iso:3166").unwrap();
    coding.set_code("code", "US").unwrap();
    let mut jurisdiction = registry.builder("CodeableConcept").unwrap();
    jurisdiction.add("coding", coding.build()).unwrap();
    value_set.add("jurisdiction", jurisdiction.build()).unwrap();

    let result = Validator::default().validate(&value_set.build());
    assert!(result.is_valid);
    let warnings: Vec<_> = result.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, IssueCode::BindingNotChecked);
    assert_eq!(warnings[0].path, "ValueSet.jurisdiction");
}

#[test]
fn test_choice_kind_recheck() {
    let registry = registry();
    let mut parameter = registry.builder("ValueSet.Expansion.Parameter").unwrap();
    parameter.set_string("name", "offset").unwrap();
    parameter.set_integer("value", 5).unwrap();
    let result = Validator::default().validate(&parameter.build());
    assert!(result.is_valid);
}

#[test]
fn test_primitive_formats() {
    let registry = registry();
    let mut prescription = create_vision_prescription(&registry, "Patient/1").to_builder();
    prescription.set_date_time("created", "2014-02-30").unwrap();
    let result = Validator::default().validate(&prescription.build());
    let violations: Vec<_> = result.rule_violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, IssueCode::PrimitiveFormat);
    assert_eq!(violations[0].path, "VisionPrescription.created");
}

#[test]
fn test_validation_does_not_mutate() {
    let registry = registry();
    let value_set = create_value_set(&registry);
    let copy = value_set.clone();
    let validator = Validator::default();
    let first = validator.validate(&value_set);
    let second = validator.validate(&value_set);
    assert_eq!(first, second);
    assert_eq!(value_set, copy);
}

#[test]
fn test_strict_build_carries_result() {
    let registry = registry();
    let validator = Validator::new(ModelConfig::strict());
    let compose = registry.builder("ValueSet.Compose").unwrap();

    match compose.build_validated(&validator) {
        Err(FhirElementError::InvalidElement { result, .. }) => {
            assert_eq!(result.rule_count, 1);
            assert_eq!(result.issues[0].path, "compose.include");
        }
        other => panic!("expected InvalidElement, got {other:?}"),
    }
}
