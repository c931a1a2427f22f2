//! Built-in schema definitions.
//!
//! Element types are data: each module returns the [`SchemaDefinition`]s for
//! one family, with backbone elements named `Resource.Backbone` and pathed
//! like `Resource.backbone`.

mod datatypes;
mod terminology_capabilities;
mod value_set;
mod vision_prescription;

use crate::types::{
    BindingInfo, Cardinality, FieldDescriptor, SchemaDefinition, ValueKind,
};

pub const PUBLICATION_STATUS: &str = "http://hl7.org/fhir/ValueSet/publication-status";
pub const JURISDICTION: &str = "http://hl7.org/fhir/ValueSet/jurisdiction";

/// Every built-in definition, datatypes first.
pub fn core_definitions() -> Vec<SchemaDefinition> {
    let mut definitions = datatypes::definitions();
    definitions.extend(value_set::definitions());
    definitions.extend(vision_prescription::definitions());
    definitions.extend(terminology_capabilities::definitions());
    definitions
}

/// Datatype definitions only. Custom schemas need at least these, since every
/// complex type carries `extension` and every resource carries `meta`.
pub fn datatype_definitions() -> Vec<SchemaDefinition> {
    datatypes::definitions()
}

pub(crate) fn optional(name: &str, kind: impl Into<ValueKind>) -> FieldDescriptor {
    FieldDescriptor::new(name, Cardinality::OptionalSingle, kind)
}

pub(crate) fn required(name: &str, kind: impl Into<ValueKind>) -> FieldDescriptor {
    FieldDescriptor::new(name, Cardinality::RequiredSingle, kind)
}

pub(crate) fn list(name: &str, kind: impl Into<ValueKind>) -> FieldDescriptor {
    FieldDescriptor::new(name, Cardinality::OptionalList, kind)
}

pub(crate) fn required_list(name: &str, kind: impl Into<ValueKind>) -> FieldDescriptor {
    FieldDescriptor::new(name, Cardinality::RequiredNonemptyList, kind)
}

/// Required binding whose member codes are enumerated inline.
pub(crate) fn required_codes(value_set: &str, system: &str, codes: &[&str]) -> BindingInfo {
    BindingInfo::required(value_set).with_codes(system, codes)
}

pub(crate) fn publication_status() -> BindingInfo {
    required_codes(
        PUBLICATION_STATUS,
        "http://hl7.org/fhir/publication-status",
        &["draft", "active", "retired", "unknown"],
    )
    .with_name("PublicationStatus")
}

pub(crate) fn jurisdiction() -> BindingInfo {
    BindingInfo::extensible(JURISDICTION).with_name("Jurisdiction")
}
