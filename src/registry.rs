//! Element schema registry.
//!
//! Schemas are write-once: registering a type name twice fails with
//! [`FhirElementError::DuplicateSchema`]. Lookups go through a lock-free
//! papaya map, so a populated registry can be shared across threads and read
//! without coordination.

use once_cell::sync::OnceCell;
use papaya::HashMap as PapayaMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::builder::ElementBuilder;
use crate::definitions;
use crate::error::{FhirElementError, Result};
use crate::types::{ElementSchema, RESOURCE_KIND, SchemaDefinition, ValueKind};

static GLOBAL_REGISTRY: OnceCell<SchemaRegistry> = OnceCell::new();

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: PapayaMap<String, Arc<ElementSchema>>,
}

impl SchemaRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in datatype and resource definitions.
    pub fn with_core_definitions() -> Result<Self> {
        let registry = Self::new();
        for definition in definitions::core_definitions() {
            registry.register(definition)?;
        }
        registry.check_references()?;
        info!(schemas = registry.len(), "Loaded core element definitions");
        Ok(registry)
    }

    /// Process-wide registry with the core definitions, initialized on first use.
    pub fn global() -> Result<&'static SchemaRegistry> {
        GLOBAL_REGISTRY.get_or_try_init(Self::with_core_definitions)
    }

    pub fn register(&self, definition: SchemaDefinition) -> Result<Arc<ElementSchema>> {
        let schema = Arc::new(ElementSchema::from_definition(definition)?);
        let type_name = schema.type_name().to_string();

        let guard = self.schemas.pin();
        match guard.try_insert(type_name.clone(), Arc::clone(&schema)) {
            Ok(_) => {
                debug!(type_name = %type_name, fields = schema.fields().len(), "Registered schema");
                Ok(schema)
            }
            Err(_) => Err(FhirElementError::duplicate_schema(type_name)),
        }
    }

    pub fn get(&self, type_name: &str) -> Result<Arc<ElementSchema>> {
        let guard = self.schemas.pin();
        guard
            .get(type_name)
            .cloned()
            .ok_or_else(|| FhirElementError::schema_not_found(type_name))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.pin().contains_key(type_name)
    }

    pub fn is_resource_type(&self, type_name: &str) -> bool {
        self.schemas
            .pin()
            .get(type_name)
            .is_some_and(|schema| schema.kind().is_resource())
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let guard = self.schemas.pin();
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resource_types(&self) -> Vec<String> {
        let guard = self.schemas.pin();
        let mut names: Vec<String> = guard
            .iter()
            .filter(|(_, schema)| schema.kind().is_resource())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Register definitions from JSON: a single definition object or an array of them.
    ///
    /// Every complex type gets an `extension` field and every resource a `meta`
    /// field, so [`check_references`](Self::check_references) only passes once
    /// `Extension` and `Meta` are registered too (see
    /// [`definitions::datatype_definitions`]).
    pub fn load_json(&self, json: &str) -> Result<usize> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let definitions: Vec<SchemaDefinition> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };

        let count = definitions.len();
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(count)
    }

    pub fn load_json_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let count = self.load_json(&content)?;
        info!(path = %path.as_ref().display(), count, "Loaded schema definitions");
        Ok(count)
    }

    /// Every element kind named by a field must resolve to a registered schema.
    pub fn check_references(&self) -> Result<()> {
        let guard = self.schemas.pin();
        let mut names: Vec<&String> = guard.keys().collect();
        names.sort();

        for name in names {
            let Some(schema) = guard.get(name) else {
                continue;
            };
            for field in schema.fields() {
                for kind in &field.value_kinds {
                    if let ValueKind::Element(target) = kind {
                        if target != RESOURCE_KIND && !guard.contains_key(target) {
                            return Err(FhirElementError::invalid_schema(
                                schema.type_name(),
                                format!(
                                    "Field '{}' names unregistered element type '{}'",
                                    field.name, target
                                ),
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn builder(&self, type_name: &str) -> Result<ElementBuilder> {
        Ok(ElementBuilder::new(self.get(type_name)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cardinality, FieldDescriptor, PrimitiveKind};

    fn sample_definition() -> SchemaDefinition {
        SchemaDefinition::complex_type("Sample").field(FieldDescriptor::new(
            "code",
            Cardinality::RequiredSingle,
            PrimitiveKind::Code,
        ))
    }

    #[test]
    fn test_register_and_get() {
        let registry = SchemaRegistry::new();
        registry.register(sample_definition()).unwrap();

        let schema = registry.get("Sample").unwrap();
        assert_eq!(schema.type_name(), "Sample");
        assert!(registry.contains("Sample"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = SchemaRegistry::new();
        registry.register(sample_definition()).unwrap();
        let err = registry.register(sample_definition()).unwrap_err();
        assert!(matches!(err, FhirElementError::DuplicateSchema { .. }));
    }

    #[test]
    fn test_missing_schema() {
        let registry = SchemaRegistry::new();
        let err = registry.get("Nope").unwrap_err();
        assert!(matches!(err, FhirElementError::SchemaNotFound { .. }));
        assert!(err.is_schema_error());
    }

    fn registry_with_datatypes() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        for definition in definitions::datatype_definitions() {
            registry.register(definition).unwrap();
        }
        registry
    }

    #[test]
    fn test_datatypes_resolve_on_their_own() {
        registry_with_datatypes().check_references().unwrap();
    }

    #[test]
    fn test_check_references_reports_unknown_kind() {
        let registry = registry_with_datatypes();
        registry
            .register(
                SchemaDefinition::complex_type("Holder")
                    .field(FieldDescriptor::new(
                        "coding",
                        Cardinality::OptionalSingle,
                        "Coding",
                    ))
                    .field(FieldDescriptor::new(
                        "dosage",
                        Cardinality::OptionalList,
                        "Dosage",
                    )),
            )
            .unwrap();
        let err = registry.check_references().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'dosage'"), "{message}");
        assert!(message.contains("'Dosage'"), "{message}");
    }

    #[test]
    fn test_check_references_needs_extension() {
        let registry = SchemaRegistry::new();
        registry.register(sample_definition()).unwrap();
        let err = registry.check_references().unwrap_err();
        assert!(err.to_string().contains("'Extension'"));
    }

    #[test]
    fn test_core_definitions() {
        let registry = SchemaRegistry::with_core_definitions().unwrap();
        assert!(registry.contains("ValueSet.Compose"));
        assert!(registry.is_resource_type("VisionPrescription"));
        assert!(!registry.is_resource_type("Coding"));
        let resources = registry.resource_types();
        assert!(resources.contains(&"TerminologyCapabilities".to_string()));
    }

    #[test]
    fn test_load_json_array() {
        let registry = registry_with_datatypes();
        let seeded = registry.len();
        let count = registry
            .load_json(
                r#"[
                    {"type": "A", "kind": "complex-type", "fields": []},
                    {"type": "B", "kind": "complex-type",
                     "fields": [{"name": "a", "cardinality": "optional-list", "types": ["A"]}]}
                ]"#,
            )
            .unwrap();
        assert_eq!(count, 2);
        registry.check_references().unwrap();
        assert_eq!(registry.len(), seeded + 2);
        let names = registry.type_names();
        assert!(names.contains(&"A".to_string()));
        assert!(names.contains(&"B".to_string()));
    }
}
