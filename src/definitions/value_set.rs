use super::{jurisdiction, list, optional, publication_status, required, required_codes, required_list};
use crate::types::{
    BindingInfo, Cardinality, FieldDescriptor, PrimitiveKind, SchemaDefinition,
};

pub(super) fn definitions() -> Vec<SchemaDefinition> {
    vec![
        value_set(),
        compose(),
        include(),
        concept(),
        designation(),
        filter(),
        expansion(),
        parameter(),
        contains(),
    ]
}

fn value_set() -> SchemaDefinition {
    SchemaDefinition::domain_resource("ValueSet")
        .field(optional("url", PrimitiveKind::Uri))
        .field(list("identifier", "Identifier"))
        .field(optional("version", PrimitiveKind::String))
        .field(optional("name", PrimitiveKind::String))
        .field(optional("title", PrimitiveKind::String))
        .field(required("status", PrimitiveKind::Code).with_binding(publication_status()))
        .field(optional("experimental", PrimitiveKind::Boolean))
        .field(optional("date", PrimitiveKind::DateTime))
        .field(optional("publisher", PrimitiveKind::String))
        .field(list("contact", "ContactDetail"))
        .field(optional("description", PrimitiveKind::Markdown))
        .field(list("useContext", "UsageContext"))
        .field(list("jurisdiction", "CodeableConcept").with_binding(jurisdiction()))
        .field(optional("immutable", PrimitiveKind::Boolean))
        .field(optional("purpose", PrimitiveKind::Markdown))
        .field(optional("copyright", PrimitiveKind::Markdown))
        .field(optional("compose", "ValueSet.Compose"))
        .field(optional("expansion", "ValueSet.Expansion"))
}

fn compose() -> SchemaDefinition {
    SchemaDefinition::backbone("ValueSet.Compose", "ValueSet.compose")
        .field(optional("lockedDate", PrimitiveKind::Date))
        .field(optional("inactive", PrimitiveKind::Boolean))
        .field(required_list("include", "ValueSet.Compose.Include"))
        .field(list("exclude", "ValueSet.Compose.Include"))
}

fn include() -> SchemaDefinition {
    SchemaDefinition::backbone("ValueSet.Compose.Include", "ValueSet.compose.include")
        .field(optional("system", PrimitiveKind::Uri))
        .field(optional("version", PrimitiveKind::String))
        .field(list("concept", "ValueSet.Compose.Include.Concept"))
        .field(list("filter", "ValueSet.Compose.Include.Filter"))
        .field(list("valueSet", PrimitiveKind::Canonical))
}

fn concept() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "ValueSet.Compose.Include.Concept",
        "ValueSet.compose.include.concept",
    )
    .field(required("code", PrimitiveKind::Code))
    .field(optional("display", PrimitiveKind::String))
    .field(list("designation", "ValueSet.Compose.Include.Concept.Designation"))
}

fn designation() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "ValueSet.Compose.Include.Concept.Designation",
        "ValueSet.compose.include.concept.designation",
    )
    .field(
        optional("language", PrimitiveKind::Code).with_binding(
            BindingInfo::preferred("http://hl7.org/fhir/ValueSet/languages")
                .with_name("Language"),
        ),
    )
    .field(
        optional("use", "Coding").with_binding(
            BindingInfo::extensible("http://hl7.org/fhir/ValueSet/designation-use")
                .with_name("ConceptDesignationUse"),
        ),
    )
    .field(required("value", PrimitiveKind::String))
}

fn filter() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "ValueSet.Compose.Include.Filter",
        "ValueSet.compose.include.filter",
    )
    .field(required("property", PrimitiveKind::Code))
    .field(
        required("op", PrimitiveKind::Code).with_binding(
            required_codes(
                "http://hl7.org/fhir/ValueSet/filter-operator",
                "http://hl7.org/fhir/filter-operator",
                &[
                    "=",
                    "is-a",
                    "descendent-of",
                    "is-not-a",
                    "regex",
                    "in",
                    "not-in",
                    "generalizes",
                    "exists",
                ],
            )
            .with_name("FilterOperator"),
        ),
    )
    .field(required("value", PrimitiveKind::String))
}

fn expansion() -> SchemaDefinition {
    SchemaDefinition::backbone("ValueSet.Expansion", "ValueSet.expansion")
        .field(optional("identifier", PrimitiveKind::Uri))
        .field(required("timestamp", PrimitiveKind::DateTime))
        .field(optional("total", PrimitiveKind::Integer))
        .field(optional("offset", PrimitiveKind::Integer))
        .field(list("parameter", "ValueSet.Expansion.Parameter"))
        .field(list("contains", "ValueSet.Expansion.Contains"))
}

fn parameter() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "ValueSet.Expansion.Parameter",
        "ValueSet.expansion.parameter",
    )
    .field(required("name", PrimitiveKind::String))
    .field(FieldDescriptor::choice(
        "value",
        Cardinality::OptionalSingle,
        [
            PrimitiveKind::String,
            PrimitiveKind::Boolean,
            PrimitiveKind::Integer,
            PrimitiveKind::Decimal,
            PrimitiveKind::Uri,
            PrimitiveKind::Code,
            PrimitiveKind::DateTime,
        ],
    ))
}

fn contains() -> SchemaDefinition {
    SchemaDefinition::backbone("ValueSet.Expansion.Contains", "ValueSet.expansion.contains")
        .field(optional("system", PrimitiveKind::Uri))
        .field(optional("abstract", PrimitiveKind::Boolean))
        .field(optional("inactive", PrimitiveKind::Boolean))
        .field(optional("version", PrimitiveKind::String))
        .field(optional("code", PrimitiveKind::Code))
        .field(optional("display", PrimitiveKind::String))
        .field(list("designation", "ValueSet.Compose.Include.Concept.Designation"))
        .field(list("contains", "ValueSet.Expansion.Contains"))
}
