mod common;

use async_trait::async_trait;
use common::*;
use octofhir_fhirelement::terminology::TerminologyResult;
use octofhir_fhirelement::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const CONDITION_CODES: &str = "http://example.org/fhir/ValueSet/condition-codes";

/// Registry with an extra type carrying a required binding that only the
/// terminology service can decide.
fn registry_with_bound_type() -> SchemaRegistry {
    let registry = registry();
    registry
        .register(
            SchemaDefinition::complex_type("ConditionCode").field(
                FieldDescriptor::new("code", Cardinality::RequiredSingle, PrimitiveKind::Code)
                    .with_binding(BindingInfo::required(CONDITION_CODES)),
            ),
        )
        .unwrap();
    registry
}

fn condition_code(registry: &SchemaRegistry, code: &str) -> Element {
    let mut builder = registry.builder("ConditionCode").unwrap();
    builder.set_code("code", code).unwrap();
    builder.build()
}

fn value_set_with_jurisdiction(registry: &SchemaRegistry, code: &str) -> Element {
    let mut coding = registry.builder("Coding").unwrap();
    coding.set_uri("system", "urn:iso:std:iso:3166").unwrap();
    coding.set_code("code", code).unwrap();
    let mut jurisdiction = registry.builder("CodeableConcept").unwrap();
    jurisdiction.add("coding", coding.build()).unwrap();

    let mut value_set = create_value_set(registry).to_builder();
    value_set.add("jurisdiction", jurisdiction.build()).unwrap();
    value_set.build()
}

fn in_memory() -> Arc<InMemoryTerminologyService> {
    let mut service = InMemoryTerminologyService::new();
    service.add_codes(CONDITION_CODES, Some("http://snomed.info/sct"), &["38341003"]);
    service.add_codes(
        "http://hl7.org/fhir/ValueSet/jurisdiction",
        Some("urn:iso:std:iso:3166"),
        &["US", "DE"],
    );
    Arc::new(service)
}

struct SlowService;

#[async_trait]
impl TerminologyService for SlowService {
    async fn check_membership(
        &self,
        _code: &str,
        _system: Option<&str>,
        _value_set: &str,
        _strength: BindingStrength,
    ) -> TerminologyResult<MembershipResult> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(MembershipResult::member())
    }
}

struct DownService;

#[async_trait]
impl TerminologyService for DownService {
    async fn check_membership(
        &self,
        _code: &str,
        _system: Option<&str>,
        _value_set: &str,
        _strength: BindingStrength,
    ) -> TerminologyResult<MembershipResult> {
        Err(TerminologyError::Unavailable {
            message: "connection refused".to_string(),
        })
    }
}

#[derive(Default)]
struct CountingService {
    calls: AtomicUsize,
}

#[async_trait]
impl TerminologyService for CountingService {
    async fn check_membership(
        &self,
        _code: &str,
        _system: Option<&str>,
        _value_set: &str,
        _strength: BindingStrength,
    ) -> TerminologyResult<MembershipResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MembershipResult::member())
    }
}

#[tokio::test]
async fn test_required_binding_member() {
    let registry = registry_with_bound_type();
    let validator = Validator::default().with_terminology(in_memory());

    let result = validator
        .validate_async(&condition_code(&registry, "38341003"))
        .await;
    assert!(result.is_valid);
    assert!(result.issues.is_empty());
}

#[tokio::test]
async fn test_required_binding_non_member_is_rule() {
    let registry = registry_with_bound_type();
    let validator = Validator::default().with_terminology(in_memory());

    let result = validator
        .validate_async(&condition_code(&registry, "00000000"))
        .await;
    let violations: Vec<_> = result.rule_violations().collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, IssueCode::Binding);
    assert_eq!(violations[0].path, "ConditionCode.code");
}

#[tokio::test]
async fn test_extensible_binding_non_member_is_warning() {
    let registry = registry();
    let validator = Validator::default().with_terminology(in_memory());

    let result = validator
        .validate_async(&value_set_with_jurisdiction(&registry, "FR"))
        .await;
    assert!(result.is_valid);
    let warnings: Vec<_> = result.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, IssueCode::Binding);

    let result = validator
        .validate_async(&value_set_with_jurisdiction(&registry, "DE"))
        .await;
    assert!(result.issues.is_empty());
}

#[tokio::test]
async fn test_missing_service_degrades_to_warning() {
    let registry = registry_with_bound_type();
    let validator = Validator::default();

    let result = validator
        .validate_async(&condition_code(&registry, "00000000"))
        .await;
    assert!(result.is_valid);
    assert_eq!(result.warning_count, 1);
    assert_eq!(result.issues[0].code, IssueCode::BindingNotChecked);
    assert_eq!(result.issues[0].severity, Severity::Warning);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_degrades_to_warning() {
    let registry = registry_with_bound_type();
    let config = ModelConfig::default().with_terminology_timeout(Duration::from_millis(100));
    let validator = Validator::new(config).with_terminology(Arc::new(SlowService));

    let result = validator
        .validate_async(&condition_code(&registry, "38341003"))
        .await;
    assert!(result.is_valid);
    assert_eq!(result.warning_count, 1);
    assert_eq!(result.issues[0].code, IssueCode::BindingNotChecked);
    assert!(result.issues[0].message.contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn test_codings_share_one_timeout() {
    let registry = registry();
    registry
        .register(
            SchemaDefinition::complex_type("ConditionCategory").field(
                FieldDescriptor::new("category", Cardinality::RequiredSingle, "CodeableConcept")
                    .with_binding(BindingInfo::required(CONDITION_CODES)),
            ),
        )
        .unwrap();

    let mut concept = registry.builder("CodeableConcept").unwrap();
    for code in ["1", "2", "3"] {
        let mut coding = registry.builder("Coding").unwrap();
        coding.set_uri("system", "http://snomed.info/sct").unwrap();
        coding.set_code("code", code).unwrap();
        concept.add("coding", coding.build()).unwrap();
    }
    let mut category = registry.builder("ConditionCategory").unwrap();
    category.set("category", concept.build()).unwrap();

    let timeout = Duration::from_millis(100);
    let config = ModelConfig::default().with_terminology_timeout(timeout);
    let validator = Validator::new(config).with_terminology(Arc::new(SlowService));

    let started = tokio::time::Instant::now();
    let result = validator.validate_async(&category.build()).await;
    assert!(started.elapsed() < timeout * 2);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].code, IssueCode::BindingNotChecked);
}

#[tokio::test]
async fn test_unavailable_service_degrades_to_warning() {
    let registry = registry_with_bound_type();
    let validator = Validator::default().with_terminology(Arc::new(DownService));

    let result = validator
        .validate_async(&condition_code(&registry, "38341003"))
        .await;
    assert!(result.is_valid);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].code, IssueCode::BindingNotChecked);
    assert!(result.issues[0].message.contains("connection refused"));
}

#[tokio::test]
async fn test_sync_validation_never_calls_service() {
    let registry = registry_with_bound_type();
    let counting = Arc::new(CountingService::default());
    let validator = Validator::default().with_terminology(counting.clone());

    let result = validator.validate(&condition_code(&registry, "38341003"));
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].code, IssueCode::BindingNotChecked);
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);

    let result = validator
        .validate_async(&condition_code(&registry, "38341003"))
        .await;
    assert!(result.issues.is_empty());
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_enumerated_bindings_are_local() {
    let registry = registry();
    let counting = Arc::new(CountingService::default());
    let validator = Validator::default().with_terminology(counting.clone());

    let result = validator
        .validate_async(&create_vision_prescription(&registry, "Patient/1"))
        .await;
    assert!(result.issues.is_empty());
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cached_service_answers_repeat_lookups() {
    let registry = registry_with_bound_type();
    let counting = Arc::new(CountingService::default());
    let cached = Arc::new(CachedTerminologyService::new(
        counting.clone(),
        &TerminologyConfig::default(),
    ));
    let validator = Validator::default().with_terminology(cached);

    for _ in 0..3 {
        let result = validator
            .validate_async(&condition_code(&registry, "38341003"))
            .await;
        assert!(result.is_valid);
    }
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}
