use super::{list, optional, required, required_codes};
use crate::types::{
    BindingInfo, Cardinality, FieldDescriptor, PrimitiveKind, SchemaDefinition,
};

pub(super) fn definitions() -> Vec<SchemaDefinition> {
    vec![
        extension(),
        coding(),
        codeable_concept(),
        reference(),
        identifier(),
        period(),
        quantity(),
        annotation(),
        contact_point(),
        contact_detail(),
        usage_context(),
        meta(),
    ]
}

fn extension() -> SchemaDefinition {
    SchemaDefinition::complex_type("Extension")
        .field(required("url", PrimitiveKind::Uri))
        .field(FieldDescriptor::choice(
            "value",
            Cardinality::OptionalSingle,
            [
                "boolean",
                "integer",
                "decimal",
                "string",
                "code",
                "uri",
                "canonical",
                "date",
                "dateTime",
                "Coding",
                "CodeableConcept",
                "Identifier",
                "Period",
                "Quantity",
                "Reference",
            ],
        ))
}

fn coding() -> SchemaDefinition {
    SchemaDefinition::complex_type("Coding")
        .field(optional("system", PrimitiveKind::Uri))
        .field(optional("version", PrimitiveKind::String))
        .field(optional("code", PrimitiveKind::Code))
        .field(optional("display", PrimitiveKind::String))
        .field(optional("userSelected", PrimitiveKind::Boolean))
}

fn codeable_concept() -> SchemaDefinition {
    SchemaDefinition::complex_type("CodeableConcept")
        .field(list("coding", "Coding"))
        .field(optional("text", PrimitiveKind::String))
}

fn reference() -> SchemaDefinition {
    SchemaDefinition::complex_type("Reference")
        .field(optional("reference", PrimitiveKind::String))
        .field(optional("type", PrimitiveKind::Uri))
        .field(optional("identifier", "Identifier"))
        .field(optional("display", PrimitiveKind::String))
}

fn identifier() -> SchemaDefinition {
    SchemaDefinition::complex_type("Identifier")
        .field(
            optional("use", PrimitiveKind::Code).with_binding(
                required_codes(
                    "http://hl7.org/fhir/ValueSet/identifier-use",
                    "http://hl7.org/fhir/identifier-use",
                    &["usual", "official", "temp", "secondary", "old"],
                )
                .with_name("IdentifierUse"),
            ),
        )
        .field(
            optional("type", "CodeableConcept").with_binding(
                BindingInfo::extensible("http://hl7.org/fhir/ValueSet/identifier-type")
                    .with_name("IdentifierType"),
            ),
        )
        .field(optional("system", PrimitiveKind::Uri))
        .field(optional("value", PrimitiveKind::String))
        .field(optional("period", "Period"))
        .field(optional("assigner", "Reference").with_targets(&["Organization"]))
}

fn period() -> SchemaDefinition {
    SchemaDefinition::complex_type("Period")
        .field(optional("start", PrimitiveKind::DateTime))
        .field(optional("end", PrimitiveKind::DateTime))
}

fn quantity() -> SchemaDefinition {
    SchemaDefinition::complex_type("Quantity")
        .field(optional("value", PrimitiveKind::Decimal))
        .field(
            optional("comparator", PrimitiveKind::Code).with_binding(
                required_codes(
                    "http://hl7.org/fhir/ValueSet/quantity-comparator",
                    "http://hl7.org/fhir/quantity-comparator",
                    &["<", "<=", ">=", ">"],
                )
                .with_name("QuantityComparator"),
            ),
        )
        .field(optional("unit", PrimitiveKind::String))
        .field(optional("system", PrimitiveKind::Uri))
        .field(optional("code", PrimitiveKind::Code))
}

fn annotation() -> SchemaDefinition {
    SchemaDefinition::complex_type("Annotation")
        .field(
            FieldDescriptor::choice("author", Cardinality::OptionalSingle, ["Reference", "string"])
                .with_targets(&["Practitioner", "Patient", "RelatedPerson", "Organization"]),
        )
        .field(optional("time", PrimitiveKind::DateTime))
        .field(required("text", PrimitiveKind::Markdown))
}

fn contact_point() -> SchemaDefinition {
    SchemaDefinition::complex_type("ContactPoint")
        .field(
            optional("system", PrimitiveKind::Code).with_binding(
                required_codes(
                    "http://hl7.org/fhir/ValueSet/contact-point-system",
                    "http://hl7.org/fhir/contact-point-system",
                    &["phone", "fax", "email", "pager", "url", "sms", "other"],
                )
                .with_name("ContactPointSystem"),
            ),
        )
        .field(optional("value", PrimitiveKind::String))
        .field(
            optional("use", PrimitiveKind::Code).with_binding(
                required_codes(
                    "http://hl7.org/fhir/ValueSet/contact-point-use",
                    "http://hl7.org/fhir/contact-point-use",
                    &["home", "work", "temp", "old", "mobile"],
                )
                .with_name("ContactPointUse"),
            ),
        )
        .field(optional("rank", PrimitiveKind::PositiveInt))
        .field(optional("period", "Period"))
}

fn contact_detail() -> SchemaDefinition {
    SchemaDefinition::complex_type("ContactDetail")
        .field(optional("name", PrimitiveKind::String))
        .field(list("telecom", "ContactPoint"))
}

fn usage_context() -> SchemaDefinition {
    SchemaDefinition::complex_type("UsageContext")
        .field(
            required("code", "Coding").with_binding(
                BindingInfo::extensible("http://hl7.org/fhir/ValueSet/usage-context-type")
                    .with_name("UsageContextType"),
            ),
        )
        .field(
            FieldDescriptor::choice(
                "value",
                Cardinality::RequiredSingle,
                ["CodeableConcept", "Quantity", "Reference"],
            )
            .with_targets(&[
                "PlanDefinition",
                "ResearchStudy",
                "InsurancePlan",
                "HealthcareService",
                "Group",
                "Location",
                "Organization",
            ]),
        )
}

fn meta() -> SchemaDefinition {
    SchemaDefinition::complex_type("Meta")
        .field(optional("versionId", PrimitiveKind::Id))
        .field(optional("lastUpdated", PrimitiveKind::Instant))
        .field(optional("source", PrimitiveKind::Uri))
        .field(list("profile", PrimitiveKind::Canonical))
        .field(list("security", "Coding"))
        .field(list("tag", "Coding"))
}
