//! One-stop facade tying registry, validator and JSON boundary together.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, warn};

use crate::builder::ElementBuilder;
use crate::config::ModelConfig;
use crate::error::{FhirElementError, Result};
use crate::json;
use crate::registry::SchemaRegistry;
use crate::terminology::{CachedTerminologyService, TerminologyService};
use crate::types::Element;
use crate::validation::{ValidationResult, Validator};

/// Builder pattern for [`FhirModel`]
#[derive(Default)]
pub struct FhirModelBuilder {
    config: ModelConfig,
    registry: Option<Arc<SchemaRegistry>>,
    terminology: Option<Arc<dyn TerminologyService>>,
    cache_terminology: bool,
}

impl FhirModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `registry` instead of a fresh registry of the built-in definitions.
    pub fn registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn terminology(mut self, service: Arc<dyn TerminologyService>) -> Self {
        self.terminology = Some(service);
        self
    }

    /// Wrap the terminology service in a cache sized by `config.terminology`.
    pub fn cache_terminology(mut self, enabled: bool) -> Self {
        self.cache_terminology = enabled;
        self
    }

    pub fn build(self) -> Result<FhirModel> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(SchemaRegistry::with_core_definitions()?),
        };

        let mut validator = Validator::new(self.config.clone());
        if let Some(service) = self.terminology {
            let service: Arc<dyn TerminologyService> = if self.cache_terminology {
                Arc::new(CachedTerminologyService::new(
                    service,
                    &self.config.terminology,
                ))
            } else {
                service
            };
            validator = validator.with_terminology(service);
        }

        info!(
            schemas = registry.len(),
            terminology = validator.has_terminology(),
            strict_build = self.config.strict_build,
            "FHIR element model ready"
        );

        Ok(FhirModel {
            config: self.config,
            registry,
            validator,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FhirModel {
    config: ModelConfig,
    registry: Arc<SchemaRegistry>,
    validator: Validator,
}

impl FhirModel {
    pub fn builder(&self, type_name: &str) -> Result<ElementBuilder> {
        self.registry.builder(type_name)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Build the element; with `strict_build` it must also be free of rule violations.
    pub fn finish(&self, builder: ElementBuilder) -> Result<Element> {
        if self.config.strict_build {
            builder.build_validated(&self.validator)
        } else {
            Ok(builder.build())
        }
    }

    pub fn validate(&self, element: &Element) -> ValidationResult {
        self.validator.validate(element)
    }

    pub async fn validate_async(&self, element: &Element) -> ValidationResult {
        self.validator.validate_async(element).await
    }

    pub fn to_json(&self, element: &Element) -> JsonValue {
        json::to_json(element)
    }

    pub fn from_json(&self, type_name: &str, value: &JsonValue) -> Result<Element> {
        let element = json::from_json(&self.registry, type_name, value)?;
        self.check_strict(element)
    }

    /// Decode a resource whose type comes from `resourceType`.
    pub fn resource_from_json(&self, value: &JsonValue) -> Result<Element> {
        let element = json::resource_from_json(&self.registry, value)?;
        self.check_strict(element)
    }

    fn check_strict(&self, element: Element) -> Result<Element> {
        if !self.config.strict_build {
            return Ok(element);
        }
        let result = self.validator.validate(&element);
        if result.has_rule_violations() {
            warn!(
                type_name = element.type_name(),
                violations = result.rule_count,
                "Decoded element rejected by strict build"
            );
            return Err(FhirElementError::invalid_element(element.type_name(), result));
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminology::InMemoryTerminologyService;
    use serde_json::json;

    #[test]
    fn test_lenient_finish_keeps_invalid_element() {
        let model = FhirModelBuilder::new().build().unwrap();
        let compose = model.builder("ValueSet.Compose").unwrap();
        let element = model.finish(compose).unwrap();
        assert!(model.validate(&element).has_rule_violations());
    }

    #[test]
    fn test_strict_finish_rejects_invalid_element() {
        let model = FhirModelBuilder::new()
            .config(ModelConfig::strict())
            .build()
            .unwrap();
        let compose = model.builder("ValueSet.Compose").unwrap();
        let err = model.finish(compose).unwrap_err();
        match err {
            FhirElementError::InvalidElement { type_name, result } => {
                assert_eq!(type_name, "ValueSet.Compose");
                assert_eq!(result.rule_count, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_decode_rejects_missing_status() {
        let model = FhirModelBuilder::new()
            .config(ModelConfig::default().with_strict_build(true))
            .build()
            .unwrap();
        let err = model
            .resource_from_json(&json!({"resourceType": "ValueSet"}))
            .unwrap_err();
        assert!(matches!(err, FhirElementError::InvalidElement { .. }));
    }

    #[tokio::test]
    async fn test_cached_terminology_is_used() {
        let mut service = InMemoryTerminologyService::new();
        service.add_codes(
            "http://hl7.org/fhir/ValueSet/languages",
            Some("urn:ietf:bcp:47"),
            &["en"],
        );
        let model = FhirModelBuilder::new()
            .terminology(Arc::new(service))
            .cache_terminology(true)
            .build()
            .unwrap();

        let mut designation = model
            .builder("ValueSet.Compose.Include.Concept.Designation")
            .unwrap();
        designation.set_code("language", "en").unwrap();
        designation.set_string("value", "Heart rate").unwrap();
        let element = model.finish(designation).unwrap();

        let result = model.validate_async(&element).await;
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }
}
