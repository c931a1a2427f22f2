use super::{list, optional, required, required_codes, required_list};
use crate::types::{BindingInfo, PrimitiveKind, SchemaDefinition};

pub(super) fn definitions() -> Vec<SchemaDefinition> {
    vec![vision_prescription(), lens_specification(), prism()]
}

fn vision_prescription() -> SchemaDefinition {
    SchemaDefinition::domain_resource("VisionPrescription")
        .field(list("identifier", "Identifier"))
        .field(
            required("status", PrimitiveKind::Code).with_binding(
                required_codes(
                    "http://hl7.org/fhir/ValueSet/fm-status",
                    "http://hl7.org/fhir/fm-status",
                    &["active", "cancelled", "draft", "entered-in-error"],
                )
                .with_name("VisionStatus"),
            ),
        )
        .field(required("created", PrimitiveKind::DateTime))
        .field(required("patient", "Reference").with_targets(&["Patient"]))
        .field(optional("encounter", "Reference").with_targets(&["Encounter"]))
        .field(required("dateWritten", PrimitiveKind::DateTime))
        .field(
            required("prescriber", "Reference").with_targets(&["Practitioner", "PractitionerRole"]),
        )
        .field(required_list(
            "lensSpecification",
            "VisionPrescription.LensSpecification",
        ))
}

fn lens_specification() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "VisionPrescription.LensSpecification",
        "VisionPrescription.lensSpecification",
    )
    .field(
        required("product", "CodeableConcept").with_binding(
            BindingInfo::example("http://hl7.org/fhir/ValueSet/vision-product")
                .with_name("VisionProduct"),
        ),
    )
    .field(
        required("eye", PrimitiveKind::Code).with_binding(
            required_codes(
                "http://hl7.org/fhir/ValueSet/vision-eye-codes",
                "http://hl7.org/fhir/vision-eye-codes",
                &["right", "left"],
            )
            .with_name("VisionEyes"),
        ),
    )
    .field(optional("sphere", PrimitiveKind::Decimal))
    .field(optional("cylinder", PrimitiveKind::Decimal))
    .field(optional("axis", PrimitiveKind::Integer))
    .field(list("prism", "VisionPrescription.LensSpecification.Prism"))
    .field(optional("add", PrimitiveKind::Decimal))
    .field(optional("power", PrimitiveKind::Decimal))
    .field(optional("backCurve", PrimitiveKind::Decimal))
    .field(optional("diameter", PrimitiveKind::Decimal))
    .field(optional("duration", "Quantity"))
    .field(optional("color", PrimitiveKind::String))
    .field(optional("brand", PrimitiveKind::String))
    .field(list("note", "Annotation"))
}

fn prism() -> SchemaDefinition {
    SchemaDefinition::backbone(
        "VisionPrescription.LensSpecification.Prism",
        "VisionPrescription.lensSpecification.prism",
    )
    .field(required("amount", PrimitiveKind::Decimal))
    .field(
        required("base", PrimitiveKind::Code).with_binding(
            required_codes(
                "http://hl7.org/fhir/ValueSet/vision-base-codes",
                "http://hl7.org/fhir/vision-base-codes",
                &["up", "down", "in", "out"],
            )
            .with_name("VisionBase"),
        ),
    )
}
