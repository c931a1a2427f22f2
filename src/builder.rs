//! Generic builder for schema-described elements.
//!
//! Setters check field names and value kinds against the schema at call time
//! and fail with [`FhirElementError::SchemaMismatch`]. `build` never fails;
//! validation is a separate pass (see [`Validator`]).

use std::sync::Arc;
use tracing::warn;

use crate::error::{FhirElementError, Result};
use crate::types::{
    Element, ElementSchema, FieldDescriptor, FieldValue, Primitive, PrimitiveKind, Value,
    ValueKind,
};
use crate::validation::Validator;

#[derive(Debug, Clone)]
pub struct ElementBuilder {
    schema: Arc<ElementSchema>,
    fields: Vec<Option<FieldValue>>,
}

impl ElementBuilder {
    pub fn new(schema: Arc<ElementSchema>) -> Self {
        let fields = vec![None; schema.fields().len()];
        Self { schema, fields }
    }

    /// Seed a builder with the field values of `element` for copy-and-modify.
    pub fn from_element(element: &Element) -> Self {
        Self {
            schema: Arc::clone(element.schema()),
            fields: element.field_slots().to_vec(),
        }
    }

    pub fn schema(&self) -> &Arc<ElementSchema> {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let position = self.schema.position(name)?;
        self.fields[position].as_ref()
    }

    /// Overwrite a single-valued field. On a choice field this replaces any value of another kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        let (position, field) = self.lookup(name)?;
        if field.is_list() {
            return Err(self.mismatch(
                name,
                format!("field is list-valued ({}); use add or add_all", field.cardinality),
            ));
        }
        self.check_kind(field, &value)?;
        self.fields[position] = Some(FieldValue::Single(value));
        Ok(self)
    }

    /// Append to a list-valued field.
    pub fn add(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        let (position, field) = self.lookup(name)?;
        if !field.is_list() {
            return Err(self.mismatch(name, "field is single-valued; use set"));
        }
        self.check_kind(field, &value)?;
        match &mut self.fields[position] {
            Some(FieldValue::List(values)) => values.push(value),
            slot => *slot = Some(FieldValue::List(vec![value])),
        }
        Ok(self)
    }

    /// Replace the whole list of a list-valued field. An empty collection clears it.
    pub fn add_all<I, V>(&mut self, name: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let (position, field) = self.lookup(name)?;
        if !field.is_list() {
            return Err(self.mismatch(name, "field is single-valued; use set"));
        }
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        for value in &values {
            self.check_kind(field, value)?;
        }
        self.fields[position] = if values.is_empty() {
            None
        } else {
            Some(FieldValue::List(values))
        };
        Ok(self)
    }

    pub fn clear(&mut self, name: &str) -> Result<&mut Self> {
        let (position, _) = self.lookup(name)?;
        self.fields[position] = None;
        Ok(self)
    }

    pub fn set_boolean(&mut self, name: &str, value: bool) -> Result<&mut Self> {
        self.set(name, Primitive::boolean(value))
    }

    /// Stores an integer under the field's integer kind (`integer`, `unsignedInt`, `positiveInt`).
    pub fn set_integer(&mut self, name: &str, value: i64) -> Result<&mut Self> {
        let (_, field) = self.lookup(name)?;
        let kind = field
            .value_kinds
            .iter()
            .find_map(|kind| match kind {
                ValueKind::Primitive(kind) if kind.is_integer() => Some(*kind),
                _ => None,
            })
            .unwrap_or(PrimitiveKind::Integer);
        self.set(name, Primitive::integral(kind, value)?)
    }

    pub fn set_string(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.set(name, Primitive::string(value))
    }

    pub fn set_code(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.set(name, Primitive::code(value))
    }

    pub fn set_uri(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.set(name, Primitive::uri(value))
    }

    pub fn set_decimal(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.set(name, Primitive::decimal(value))
    }

    pub fn set_date_time(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.set(name, Primitive::date_time(value))
    }

    /// Stores text under the field's own text kind; the field must not be a choice.
    pub fn set_text(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        let kind = self.text_kind(name)?;
        self.set(name, Primitive::text(kind, value)?)
    }

    /// Appends text to a list field under its declared text kind.
    pub fn add_text(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        let kind = self.text_kind(name)?;
        self.add(name, Primitive::text(kind, value)?)
    }

    /// Produce the immutable element. Never fails; see [`build_validated`](Self::build_validated).
    pub fn build(self) -> Element {
        Element::from_parts(self.schema, self.fields)
    }

    /// Build, then reject the element if validation reports any rule violation.
    pub fn build_validated(self, validator: &Validator) -> Result<Element> {
        let element = self.build();
        let result = validator.validate(&element);
        if result.has_rule_violations() {
            warn!(
                type_name = element.type_name(),
                violations = result.rule_count,
                "Rejected element in strict build"
            );
            return Err(FhirElementError::invalid_element(
                element.type_name(),
                result,
            ));
        }
        Ok(element)
    }

    fn lookup(&self, name: &str) -> Result<(usize, &FieldDescriptor)> {
        let position = self
            .schema
            .position(name)
            .ok_or_else(|| self.mismatch(name, "unknown field"))?;
        Ok((position, &self.schema.fields()[position]))
    }

    fn check_kind(&self, field: &FieldDescriptor, value: &Value) -> Result<()> {
        if field.accepts(value) {
            return Ok(());
        }
        Err(self.mismatch(
            &field.name,
            format!(
                "value of kind {} is not one of {}",
                value.kind(),
                field.kinds_display()
            ),
        ))
    }

    fn text_kind(&self, name: &str) -> Result<PrimitiveKind> {
        let (_, field) = self.lookup(name)?;
        match field.value_kinds.as_slice() {
            [ValueKind::Primitive(kind)] if kind.is_text() => Ok(*kind),
            _ => Err(self.mismatch(
                name,
                format!("field of kind {} does not take text", field.kinds_display()),
            )),
        }
    }

    fn mismatch(&self, field: &str, message: impl Into<String>) -> FhirElementError {
        FhirElementError::schema_mismatch(self.schema.type_name(), field, message)
    }
}
