use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use super::schema::{ElementSchema, FieldDescriptor};
use super::value::{FieldValue, Value};
use crate::builder::ElementBuilder;

/// Immutable instance of a schema-described element.
///
/// Field storage is a table parallel to the schema's field list, so every
/// accessor, traversal and comparison runs in schema order. The structural
/// hash is computed on first request and cached alongside the instance.
#[derive(Clone)]
pub struct Element {
    schema: Arc<ElementSchema>,
    fields: Vec<Option<FieldValue>>,
    hash: OnceLock<u64>,
}

impl Element {
    /// Caller guarantees `fields` is parallel to `schema.fields()` and holds no empty lists.
    pub(crate) fn from_parts(schema: Arc<ElementSchema>, fields: Vec<Option<FieldValue>>) -> Self {
        debug_assert_eq!(schema.fields().len(), fields.len());
        Self {
            schema,
            fields,
            hash: OnceLock::new(),
        }
    }

    pub fn schema(&self) -> &Arc<ElementSchema> {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn is_resource(&self) -> bool {
        self.schema.kind().is_resource()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let position = self.schema.position(name)?;
        self.fields[position].as_ref()
    }

    /// Single value of `name`, or the first entry of a list field.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(|field| field.values().first())
    }

    pub fn values(&self, name: &str) -> &[Value] {
        self.get(name).map(FieldValue::values).unwrap_or(&[])
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Present fields with their descriptors, in schema order.
    pub fn fields(&self) -> impl DoubleEndedIterator<Item = (&FieldDescriptor, &FieldValue)> {
        self.schema
            .fields()
            .iter()
            .zip(self.fields.iter())
            .filter_map(|(descriptor, value)| value.as_ref().map(|value| (descriptor, value)))
    }

    pub(crate) fn field_slots(&self) -> &[Option<FieldValue>] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(Option::is_none)
    }

    /// Mirrors FHIR's ele-1 invariant: an element needs a value or children.
    pub fn has_value_or_children(&self) -> bool {
        !self.is_empty()
    }

    pub fn to_builder(&self) -> ElementBuilder {
        ElementBuilder::from_element(self)
    }

    pub fn hash_code(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            self.schema.type_name().hash(&mut hasher);
            self.fields.hash(&mut hasher);
            hasher.finish()
        })
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.schema.type_name() != other.schema.type_name() {
            return false;
        }
        if let (Some(a), Some(b)) = (self.hash.get(), other.hash.get()) {
            if a != b {
                return false;
            }
        }
        self.fields == other.fields
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.type_name());
        for (descriptor, value) in self.fields() {
            match value {
                FieldValue::Single(value) => out.field(&descriptor.name, value),
                FieldValue::List(values) => out.field(&descriptor.name, values),
            };
        }
        out.finish()
    }
}
