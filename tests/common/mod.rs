use octofhir_fhirelement::*;

#[allow(dead_code)]
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::with_core_definitions().unwrap()
}

#[allow(dead_code)]
pub fn create_include(registry: &SchemaRegistry, system: &str, codes: &[&str]) -> Element {
    let mut include = registry.builder("ValueSet.Compose.Include").unwrap();
    include.set_uri("system", system).unwrap();
    for code in codes {
        let mut concept = registry.builder("ValueSet.Compose.Include.Concept").unwrap();
        concept.set_code("code", code).unwrap();
        include.add("concept", concept.build()).unwrap();
    }
    include.build()
}

#[allow(dead_code)]
pub fn create_compose(registry: &SchemaRegistry) -> Element {
    let mut compose = registry.builder("ValueSet.Compose").unwrap();
    compose
        .add("include", create_include(registry, "http://x/codes", &["A"]))
        .unwrap();
    compose.build()
}

#[allow(dead_code)]
pub fn create_value_set(registry: &SchemaRegistry) -> Element {
    let mut value_set = registry.builder("ValueSet").unwrap();
    value_set.set_text("id", "example-codes").unwrap();
    value_set.set_text("url", "http://example.org/fhir/ValueSet/example-codes").unwrap();
    value_set.set_string("name", "ExampleCodes").unwrap();
    value_set.set_code("status", "active").unwrap();
    value_set.set_boolean("experimental", true).unwrap();
    value_set.set("compose", create_compose(registry)).unwrap();
    value_set.build()
}

#[allow(dead_code)]
pub fn create_reference(registry: &SchemaRegistry, literal: &str) -> Element {
    let mut reference = registry.builder("Reference").unwrap();
    reference.set_string("reference", literal).unwrap();
    reference.build()
}

#[allow(dead_code)]
pub fn create_lens(registry: &SchemaRegistry, eye: &str) -> Element {
    let mut coding = registry.builder("Coding").unwrap();
    coding
        .set_uri("system", "http://terminology.hl7.org/CodeSystem/ex-visionprescriptionproduct")
        .unwrap();
    coding.set_code("code", "lens").unwrap();
    let mut product = registry.builder("CodeableConcept").unwrap();
    product.add("coding", coding.build()).unwrap();

    let mut lens = registry.builder("VisionPrescription.LensSpecification").unwrap();
    lens.set("product", product.build()).unwrap();
    lens.set_code("eye", eye).unwrap();
    lens.set_decimal("sphere", "-2.00").unwrap();
    lens.set_integer("axis", 180).unwrap();
    lens.build()
}

#[allow(dead_code)]
pub fn create_vision_prescription(registry: &SchemaRegistry, patient: &str) -> Element {
    let mut prescription = registry.builder("VisionPrescription").unwrap();
    prescription.set_text("id", "33123").unwrap();
    prescription.set_code("status", "active").unwrap();
    prescription.set_date_time("created", "2014-06-15").unwrap();
    prescription
        .set("patient", create_reference(registry, patient))
        .unwrap();
    prescription.set_date_time("dateWritten", "2014-06-15").unwrap();
    prescription
        .set("prescriber", create_reference(registry, "Practitioner/example"))
        .unwrap();
    prescription
        .add_all(
            "lensSpecification",
            [create_lens(registry, "right"), create_lens(registry, "left")],
        )
        .unwrap();
    prescription.build()
}
