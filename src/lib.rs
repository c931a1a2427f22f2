//! # OctoFHIR FHIR Element
//!
//! Schema-driven FHIR elements: one generic element type whose fields are
//! described by registered schemas, instead of one struct per resource.
//!
//! ## Features
//!
//! - **Registry**: element schemas as data, with built-in datatypes, ValueSet,
//!   VisionPrescription and TerminologyCapabilities
//! - **Builder**: schema-checked construction of immutable elements
//! - **Validation**: cardinality, choice types, reference targets, bindings and
//!   primitive formats, with async terminology checks
//! - **Traversal**: stack-based pre-order visitor with skip and abort
//! - **JSON**: FHIR JSON encoding and decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octofhir_fhirelement::*;
//!
//! # fn example() -> Result<()> {
//! let model = FhirModelBuilder::new().build()?;
//!
//! let mut include = model.builder("ValueSet.Compose.Include")?;
//! include.set_uri("system", "http://loinc.org")?;
//!
//! let mut compose = model.builder("ValueSet.Compose")?;
//! compose.add("include", include.build())?;
//! let compose = model.finish(compose)?;
//!
//! let result = model.validate(&compose);
//! assert!(result.is_valid);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod definitions;
pub mod error;
pub mod json;
pub mod model;
pub mod reference;
pub mod registry;
pub mod terminology;
pub mod types;
pub mod validation;
pub mod visitor;

pub use builder::ElementBuilder;
pub use config::{ModelConfig, TerminologyConfig};
pub use error::Result; // Our Result type takes precedence
pub use error::FhirElementError;
pub use json::{from_json, resource_from_json, to_json};
pub use model::{FhirModel, FhirModelBuilder};
pub use reference::{
    InMemoryReferenceResolver, NoOpReferenceResolver, ParsedReference, ReferenceError,
    ReferenceKind, ReferenceResolver, parse_reference,
};
pub use registry::SchemaRegistry;
pub use terminology::{
    CachedTerminologyService, InMemoryTerminologyService, MembershipResult, TerminologyError,
    TerminologyService,
};
pub use types::*;
pub use validation::{IssueCode, Severity, ValidationIssue, ValidationResult, Validator};
pub use visitor::{CollectingVisitor, TraversalOutcome, Visitor, traverse, traverse_named};
