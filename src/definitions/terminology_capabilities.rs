use super::{
    jurisdiction, list, optional, publication_status, required, required_codes, required_list,
};
use crate::types::{BindingInfo, PrimitiveKind, SchemaDefinition};

pub(super) fn definitions() -> Vec<SchemaDefinition> {
    vec![
        terminology_capabilities(),
        software(),
        implementation(),
        code_system(),
        code_system_version(),
        version_filter(),
        expansion(),
        expansion_parameter(),
        validate_code(),
        translation(),
        closure(),
    ]
}

fn terminology_capabilities() -> SchemaDefinition {
    SchemaDefinition::domain_resource("TerminologyCapabilities")
        .field(optional("url", PrimitiveKind::Uri))
        .field(optional("version", PrimitiveKind::String))
        .field(optional("name", PrimitiveKind::String))
        .field(optional("title", PrimitiveKind::String))
        .field(required("status", PrimitiveKind::Code).with_binding(publication_status()))
        .field(optional("experimental", PrimitiveKind::Boolean))
        .field(required("date", PrimitiveKind::DateTime))
        .field(optional("publisher", PrimitiveKind::String))
        .field(list("contact", "ContactDetail"))
        .field(optional("description", PrimitiveKind::Markdown))
        .field(list("useContext", "UsageContext"))
        .field(list("jurisdiction", "CodeableConcept").with_binding(jurisdiction()))
        .field(optional("purpose", PrimitiveKind::Markdown))
        .field(optional("copyright", PrimitiveKind::Markdown))
        .field(
            required("kind", PrimitiveKind::Code).with_binding(
                required_codes(
                    "http://hl7.org/fhir/ValueSet/capability-statement-kind",
                    "http://hl7.org/fhir/capability-statement-kind",
                    &["instance", "capability", "requirements"],
                )
                .with_name("CapabilityStatementKind"),
            ),
        )
        .field(optional("software", "TerminologyCapabilities.Software"))
        .field(optional(
            "implementation",
            "TerminologyCapabilities.Implementation",
        ))
        .field(optional("lockedDate", PrimitiveKind::Boolean))
        .field(list("codeSystem", "TerminologyCapabilities.CodeSystem"))
        .field(optional("expansion", "TerminologyCapabilities.Expansion"))
        .field(
            optional("codeSearch", PrimitiveKind::Code).with_binding(
                required_codes(
                    "http://hl7.org/fhir/ValueSet/code-search-support",
                    "http://hl7.org/fhir/code-search-support",
                    &["explicit", "all"],
                )
                .with_name("CodeSearchSupport"),
            ),
        )
        .field(optional(
            "validateCode",
            "TerminologyCapabilities.ValidateCode",
        ))
        .field(optional("translation", "TerminologyCapabilities.Translation"))
        .field(optional("closure", "TerminologyCapabilities.Closure"))
}

fn software() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.Software",
        "TerminologyCapabilities.software",
    )
    .field(required("name", PrimitiveKind::String))
    .field(optional("version", PrimitiveKind::String))
}

fn implementation() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.Implementation",
        "TerminologyCapabilities.implementation",
    )
    .field(required("description", PrimitiveKind::String))
    .field(optional("url", PrimitiveKind::Url))
}

fn code_system() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.CodeSystem",
        "TerminologyCapabilities.codeSystem",
    )
    .field(optional("uri", PrimitiveKind::Canonical))
    .field(list("version", "TerminologyCapabilities.CodeSystem.Version"))
    .field(optional("subsumption", PrimitiveKind::Boolean))
}

fn code_system_version() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.CodeSystem.Version",
        "TerminologyCapabilities.codeSystem.version",
    )
    .field(optional("code", PrimitiveKind::String))
    .field(optional("isDefault", PrimitiveKind::Boolean))
    .field(optional("compositional", PrimitiveKind::Boolean))
    .field(
        list("language", PrimitiveKind::Code).with_binding(
            BindingInfo::preferred("http://hl7.org/fhir/ValueSet/languages").with_name("Language"),
        ),
    )
    .field(list(
        "filter",
        "TerminologyCapabilities.CodeSystem.Version.Filter",
    ))
    .field(list("property", PrimitiveKind::Code))
}

fn version_filter() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.CodeSystem.Version.Filter",
        "TerminologyCapabilities.codeSystem.version.filter",
    )
    .field(required("code", PrimitiveKind::Code))
    .field(required_list("op", PrimitiveKind::Code))
}

fn expansion() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.Expansion",
        "TerminologyCapabilities.expansion",
    )
    .field(optional("hierarchical", PrimitiveKind::Boolean))
    .field(optional("paging", PrimitiveKind::Boolean))
    .field(optional("incomplete", PrimitiveKind::Boolean))
    .field(list(
        "parameter",
        "TerminologyCapabilities.Expansion.Parameter",
    ))
    .field(optional("textFilter", PrimitiveKind::Markdown))
}

fn expansion_parameter() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.Expansion.Parameter",
        "TerminologyCapabilities.expansion.parameter",
    )
    .field(required("name", PrimitiveKind::Code))
    .field(optional("documentation", PrimitiveKind::String))
}

fn validate_code() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.ValidateCode",
        "TerminologyCapabilities.validateCode",
    )
    .field(required("translations", PrimitiveKind::Boolean))
}

fn translation() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.Translation",
        "TerminologyCapabilities.translation",
    )
    .field(required("needsMap", PrimitiveKind::Boolean))
}

fn closure() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "TerminologyCapabilities.Closure",
        "TerminologyCapabilities.closure",
    )
    .field(optional("translation", PrimitiveKind::Boolean))
}
