use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::value::Value;
use crate::error::{FhirElementError, Result};

/// Abstract element kind accepted by fields that hold any resource (e.g. `contained`).
pub const RESOURCE_KIND: &str = "Resource";

/// Element kind whose values are reference-shaped.
pub const REFERENCE_KIND: &str = "Reference";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    UnsignedInt,
    PositiveInt,
    Decimal,
    String,
    Code,
    Id,
    Markdown,
    Uri,
    Url,
    Canonical,
    Oid,
    Uuid,
    Date,
    DateTime,
    Instant,
    Time,
    Base64Binary,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 19] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Integer,
        PrimitiveKind::UnsignedInt,
        PrimitiveKind::PositiveInt,
        PrimitiveKind::Decimal,
        PrimitiveKind::String,
        PrimitiveKind::Code,
        PrimitiveKind::Id,
        PrimitiveKind::Markdown,
        PrimitiveKind::Uri,
        PrimitiveKind::Url,
        PrimitiveKind::Canonical,
        PrimitiveKind::Oid,
        PrimitiveKind::Uuid,
        PrimitiveKind::Date,
        PrimitiveKind::DateTime,
        PrimitiveKind::Instant,
        PrimitiveKind::Time,
        PrimitiveKind::Base64Binary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::UnsignedInt => "unsignedInt",
            PrimitiveKind::PositiveInt => "positiveInt",
            PrimitiveKind::Decimal => "decimal",
            PrimitiveKind::String => "string",
            PrimitiveKind::Code => "code",
            PrimitiveKind::Id => "id",
            PrimitiveKind::Markdown => "markdown",
            PrimitiveKind::Uri => "uri",
            PrimitiveKind::Url => "url",
            PrimitiveKind::Canonical => "canonical",
            PrimitiveKind::Oid => "oid",
            PrimitiveKind::Uuid => "uuid",
            PrimitiveKind::Date => "date",
            PrimitiveKind::DateTime => "dateTime",
            PrimitiveKind::Instant => "instant",
            PrimitiveKind::Time => "time",
            PrimitiveKind::Base64Binary => "base64Binary",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == s)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, PrimitiveKind::Boolean)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Integer | PrimitiveKind::UnsignedInt | PrimitiveKind::PositiveInt
        )
    }

    /// Text-backed kinds store their lexical form.
    pub fn is_text(&self) -> bool {
        !self.is_boolean() && !self.is_integer()
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permitted value kind for a field: a primitive or a named element type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueKind {
    Primitive(PrimitiveKind),
    Element(String),
}

impl ValueKind {
    pub fn type_name(&self) -> &str {
        match self {
            ValueKind::Primitive(kind) => kind.as_str(),
            ValueKind::Element(name) => name,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ValueKind::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, ValueKind::Element(name) if name == REFERENCE_KIND)
    }

    /// Suffix appended to a choice field's name in serialized form (`value` + `DateTime`).
    pub fn choice_suffix(&self) -> String {
        let name = self.type_name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl From<PrimitiveKind> for ValueKind {
    fn from(kind: PrimitiveKind) -> Self {
        ValueKind::Primitive(kind)
    }
}

impl From<&str> for ValueKind {
    fn from(name: &str) -> Self {
        match PrimitiveKind::parse_str(name) {
            Some(kind) => ValueKind::Primitive(kind),
            None => ValueKind::Element(name.to_string()),
        }
    }
}

impl From<String> for ValueKind {
    fn from(name: String) -> Self {
        match PrimitiveKind::parse_str(&name) {
            Some(kind) => ValueKind::Primitive(kind),
            None => ValueKind::Element(name),
        }
    }
}

impl From<ValueKind> for String {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Primitive(kind) => kind.as_str().to_string(),
            ValueKind::Element(name) => name,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    OptionalSingle,
    RequiredSingle,
    OptionalList,
    RequiredNonemptyList,
}

impl Cardinality {
    pub fn from_bounds(min: u32, max: Option<u32>) -> Self {
        let list = !matches!(max, Some(0) | Some(1));
        match (min > 0, list) {
            (false, false) => Cardinality::OptionalSingle,
            (true, false) => Cardinality::RequiredSingle,
            (false, true) => Cardinality::OptionalList,
            (true, true) => Cardinality::RequiredNonemptyList,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Cardinality::OptionalList | Cardinality::RequiredNonemptyList
        )
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Cardinality::RequiredSingle | Cardinality::RequiredNonemptyList
        )
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Cardinality::OptionalSingle => "0..1",
            Cardinality::RequiredSingle => "1..1",
            Cardinality::OptionalList => "0..*",
            Cardinality::RequiredNonemptyList => "1..*",
        };
        f.write_str(text)
    }
}

/// FHIR binding strength levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStrength {
    /// Code MUST be from the value set
    Required,
    /// Code SHOULD be from the value set, but others allowed with text
    Extensible,
    /// Code SHOULD be from the value set for interoperability
    Preferred,
    /// Value set is just an example
    Example,
}

impl BindingStrength {
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "required" => Some(BindingStrength::Required),
            "extensible" => Some(BindingStrength::Extensible),
            "preferred" => Some(BindingStrength::Preferred),
            "example" => Some(BindingStrength::Example),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BindingStrength::Required => "required",
            BindingStrength::Extensible => "extensible",
            BindingStrength::Preferred => "preferred",
            BindingStrength::Example => "example",
        }
    }

    /// Whether validation failure at this strength is an error
    pub fn is_error_on_failure(&self) -> bool {
        matches!(self, BindingStrength::Required)
    }

    /// Whether validation failure at this strength should produce a warning
    pub fn is_warning_on_failure(&self) -> bool {
        matches!(self, BindingStrength::Extensible)
    }
}

impl fmt::Display for BindingStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminology binding declared on a coded field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub strength: BindingStrength,
    #[serde(rename = "valueSet")]
    pub value_set: String,
    /// Code system of the inline codes, when the binding enumerates them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Enumerated member codes; empty means membership is decided by a terminology service.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<String>,
}

impl BindingInfo {
    pub fn new(strength: BindingStrength, value_set: impl Into<String>) -> Self {
        Self {
            name: None,
            strength,
            value_set: value_set.into(),
            system: None,
            codes: Vec::new(),
        }
    }

    pub fn required(value_set: impl Into<String>) -> Self {
        Self::new(BindingStrength::Required, value_set)
    }

    pub fn extensible(value_set: impl Into<String>) -> Self {
        Self::new(BindingStrength::Extensible, value_set)
    }

    pub fn preferred(value_set: impl Into<String>) -> Self {
        Self::new(BindingStrength::Preferred, value_set)
    }

    pub fn example(value_set: impl Into<String>) -> Self {
        Self::new(BindingStrength::Example, value_set)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_codes(mut self, system: impl Into<String>, codes: &[&str]) -> Self {
        self.system = Some(system.into());
        self.codes = codes.iter().map(|code| code.to_string()).collect();
        self
    }

    pub fn is_enumerated(&self) -> bool {
        !self.codes.is_empty()
    }
}

/// Describes one field of an element type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub cardinality: Cardinality,
    #[serde(rename = "types")]
    pub value_kinds: Vec<ValueKind>,
    #[serde(rename = "targetTypes", default, skip_serializing_if = "Vec::is_empty")]
    pub target_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<BindingInfo>,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        cardinality: Cardinality,
        kind: impl Into<ValueKind>,
    ) -> Self {
        Self {
            name: name.into(),
            cardinality,
            value_kinds: vec![kind.into()],
            target_types: Vec::new(),
            binding: None,
        }
    }

    pub fn choice<I, K>(name: impl Into<String>, cardinality: Cardinality, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ValueKind>,
    {
        Self {
            name: name.into(),
            cardinality,
            value_kinds: kinds.into_iter().map(Into::into).collect(),
            target_types: Vec::new(),
            binding: None,
        }
    }

    pub fn with_targets(mut self, targets: &[&str]) -> Self {
        self.target_types = targets.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_binding(mut self, binding: BindingInfo) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn is_choice(&self) -> bool {
        self.value_kinds.len() > 1
    }

    pub fn is_list(&self) -> bool {
        self.cardinality.is_list()
    }

    pub fn is_required(&self) -> bool {
        self.cardinality.is_required()
    }

    /// A field constrains reference targets when it lists allowed target types.
    pub fn is_reference(&self) -> bool {
        !self.target_types.is_empty()
    }

    pub fn permits(&self, kind: &ValueKind) -> bool {
        self.value_kinds.iter().any(|declared| declared == kind)
    }

    /// Whether `value` has one of the declared kinds; a `Resource` kind takes any resource.
    pub fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::Primitive(primitive) => self.permits(&ValueKind::Primitive(primitive.kind())),
            Value::Element(element) => self.value_kinds.iter().any(|declared| match declared {
                ValueKind::Element(name) if name == RESOURCE_KIND => element.is_resource(),
                ValueKind::Element(name) => name == element.type_name(),
                ValueKind::Primitive(_) => false,
            }),
        }
    }

    /// Kind whose serialized choice name (`value` + suffix) equals `key`.
    pub fn choice_kind_for_key(&self, key: &str) -> Option<&ValueKind> {
        let suffix = key.strip_prefix(self.name.as_str())?;
        self.value_kinds
            .iter()
            .find(|kind| kind.choice_suffix() == suffix)
    }

    pub fn kinds_display(&self) -> String {
        let names: Vec<&str> = self.value_kinds.iter().map(|k| k.type_name()).collect();
        format!("[{}]", names.join(", "))
    }

    pub fn validate(&self, type_name: &str) -> Result<()> {
        if self.name.is_empty() {
            return Err(FhirElementError::invalid_schema(
                type_name,
                "Field name cannot be empty",
            ));
        }
        if self.value_kinds.is_empty() {
            return Err(FhirElementError::invalid_schema(
                type_name,
                format!("Field '{}' declares no value kinds", self.name),
            ));
        }
        if self.is_choice() && self.is_list() {
            return Err(FhirElementError::invalid_schema(
                type_name,
                format!("Choice field '{}' cannot be list-valued", self.name),
            ));
        }
        if self.is_reference() && !self.value_kinds.iter().any(ValueKind::is_reference) {
            return Err(FhirElementError::invalid_schema(
                type_name,
                format!(
                    "Field '{}' declares target types but no {} kind",
                    self.name, REFERENCE_KIND
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaKind {
    ComplexType,
    BackboneElement,
    Resource,
    DomainResource,
}

impl SchemaKind {
    pub fn is_resource(&self) -> bool {
        matches!(self, SchemaKind::Resource | SchemaKind::DomainResource)
    }

    /// Base fields every element of this kind carries, in declaration order.
    pub fn base_fields(&self) -> Vec<FieldDescriptor> {
        use Cardinality::*;
        let id = FieldDescriptor::new("id", OptionalSingle, PrimitiveKind::String);
        let extension = FieldDescriptor::new("extension", OptionalList, "Extension");
        let modifier_extension =
            FieldDescriptor::new("modifierExtension", OptionalList, "Extension");
        let resource_fields = || {
            vec![
                FieldDescriptor::new("id", OptionalSingle, PrimitiveKind::Id),
                FieldDescriptor::new("meta", OptionalSingle, "Meta"),
                FieldDescriptor::new("implicitRules", OptionalSingle, PrimitiveKind::Uri),
                FieldDescriptor::new("language", OptionalSingle, PrimitiveKind::Code),
            ]
        };

        match self {
            SchemaKind::ComplexType => vec![id, extension],
            SchemaKind::BackboneElement => vec![id, extension, modifier_extension],
            SchemaKind::Resource => resource_fields(),
            SchemaKind::DomainResource => {
                let mut fields = resource_fields();
                fields.push(FieldDescriptor::new("contained", OptionalList, RESOURCE_KIND));
                fields.push(extension);
                fields.push(modifier_extension);
                fields
            }
        }
    }
}

/// Input form of a schema, before base fields are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub kind: SchemaKind,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl SchemaDefinition {
    pub fn new(type_name: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            type_name: type_name.into(),
            path: None,
            kind,
            fields: Vec::new(),
        }
    }

    pub fn complex_type(type_name: impl Into<String>) -> Self {
        Self::new(type_name, SchemaKind::ComplexType)
    }

    pub fn domain_resource(type_name: impl Into<String>) -> Self {
        Self::new(type_name, SchemaKind::DomainResource)
    }

    pub fn backbone(type_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(type_name, SchemaKind::BackboneElement)
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

/// Immutable, registered description of an element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSchema {
    type_name: String,
    path: String,
    kind: SchemaKind,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl ElementSchema {
    pub fn from_definition(definition: SchemaDefinition) -> Result<Self> {
        let SchemaDefinition {
            type_name,
            path,
            kind,
            fields: declared,
        } = definition;

        if type_name.is_empty() {
            return Err(FhirElementError::invalid_schema(
                "<unnamed>",
                "Schema type cannot be empty",
            ));
        }

        let mut fields = kind.base_fields();
        fields.extend(declared);

        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            field.validate(&type_name)?;
            if index.insert(field.name.clone(), position).is_some() {
                return Err(FhirElementError::invalid_schema(
                    &type_name,
                    format!("Duplicate field '{}'", field.name),
                ));
            }
        }

        Ok(Self {
            path: path.unwrap_or_else(|| type_name.clone()),
            type_name,
            kind,
            fields,
            index,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// Name used for the root segment of diagnostic paths (`compose` for `ValueSet.compose`).
    pub fn element_name(&self) -> &str {
        if self.kind.is_resource() {
            return &self.type_name;
        }
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&position| &self.fields[position])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of leading fields contributed by the schema kind.
    pub fn base_field_count(&self) -> usize {
        self.kind.base_fields().len()
    }

    /// Field whose serialized key is `key`: its own name, or `name + Suffix` for choices.
    pub fn field_for_key(&self, key: &str) -> Option<(&FieldDescriptor, Option<&ValueKind>)> {
        if let Some(field) = self.field(key) {
            if !field.is_choice() {
                return Some((field, None));
            }
        }
        self.fields
            .iter()
            .filter(|field| field.is_choice())
            .find_map(|field| field.choice_kind_for_key(key).map(|kind| (field, Some(kind))))
    }
}

impl fmt::Display for ElementSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementSchema({})", self.type_name)?;
        if self.path != self.type_name {
            write!(f, " [{}]", self.path)?;
        }
        Ok(())
    }
}
