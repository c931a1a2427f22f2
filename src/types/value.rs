use std::fmt;
use std::sync::Arc;

use super::element::Element;
use super::schema::{PrimitiveKind, ValueKind};
use crate::error::{FhirElementError, Result};

/// Raw payload of a primitive; text-backed kinds keep their lexical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveValue {
    Boolean(bool),
    Integer(i64),
    Text(Arc<str>),
}

/// A primitive tagged with its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Primitive {
    kind: PrimitiveKind,
    value: PrimitiveValue,
}

impl Primitive {
    pub fn boolean(value: bool) -> Self {
        Self {
            kind: PrimitiveKind::Boolean,
            value: PrimitiveValue::Boolean(value),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            kind: PrimitiveKind::Integer,
            value: PrimitiveValue::Integer(value),
        }
    }

    pub fn unsigned_int(value: i64) -> Self {
        Self {
            kind: PrimitiveKind::UnsignedInt,
            value: PrimitiveValue::Integer(value),
        }
    }

    pub fn positive_int(value: i64) -> Self {
        Self {
            kind: PrimitiveKind::PositiveInt,
            value: PrimitiveValue::Integer(value),
        }
    }

    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Self::text_unchecked(PrimitiveKind::String, value)
    }

    pub fn code(value: impl Into<Arc<str>>) -> Self {
        Self::text_unchecked(PrimitiveKind::Code, value)
    }

    pub fn uri(value: impl Into<Arc<str>>) -> Self {
        Self::text_unchecked(PrimitiveKind::Uri, value)
    }

    pub fn canonical(value: impl Into<Arc<str>>) -> Self {
        Self::text_unchecked(PrimitiveKind::Canonical, value)
    }

    pub fn date_time(value: impl Into<Arc<str>>) -> Self {
        Self::text_unchecked(PrimitiveKind::DateTime, value)
    }

    /// Decimals keep their lexical form so `1.50` stays `1.50`.
    pub fn decimal(value: impl Into<Arc<str>>) -> Self {
        Self::text_unchecked(PrimitiveKind::Decimal, value)
    }

    /// Text value of a text-backed kind; boolean and integer kinds are rejected.
    pub fn text(kind: PrimitiveKind, value: impl Into<Arc<str>>) -> Result<Self> {
        if !kind.is_text() {
            return Err(FhirElementError::schema_mismatch(
                kind.as_str(),
                "value",
                format!("{} is not a text-backed primitive", kind),
            ));
        }
        Ok(Self::text_unchecked(kind, value))
    }

    /// Integer value of an integer kind.
    pub fn integral(kind: PrimitiveKind, value: i64) -> Result<Self> {
        if !kind.is_integer() {
            return Err(FhirElementError::schema_mismatch(
                kind.as_str(),
                "value",
                format!("{} is not an integer primitive", kind),
            ));
        }
        Ok(Self {
            kind,
            value: PrimitiveValue::Integer(value),
        })
    }

    fn text_unchecked(kind: PrimitiveKind, value: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            value: PrimitiveValue::Text(value.into()),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn value(&self) -> &PrimitiveValue {
        &self.value
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            PrimitiveValue::Boolean(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            PrimitiveValue::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            PrimitiveValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            PrimitiveValue::Boolean(value) => write!(f, "{}", value),
            PrimitiveValue::Integer(value) => write!(f, "{}", value),
            PrimitiveValue::Text(text) => f.write_str(text),
        }
    }
}

/// A single value stored in a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Primitive(Primitive),
    Element(Element),
}

impl Value {
    /// Concrete kind of this value; choice fields store it resolved.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Primitive(primitive) => ValueKind::Primitive(primitive.kind()),
            Value::Element(element) => ValueKind::Element(element.type_name().to_string()),
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(primitive) => Some(primitive),
            Value::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Value::Element(element) => Some(element),
            Value::Primitive(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_primitive().and_then(Primitive::as_bool)
    }

    pub fn as_integer(&self) -> Option<i64> {
        self.as_primitive().and_then(Primitive::as_integer)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().and_then(Primitive::as_str)
    }
}

impl From<Primitive> for Value {
    fn from(primitive: Primitive) -> Self {
        Value::Primitive(primitive)
    }
}

impl From<Element> for Value {
    fn from(element: Element) -> Self {
        Value::Element(element)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Primitive(Primitive::boolean(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Primitive(Primitive::integer(i64::from(value)))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Primitive(Primitive::string(value))
    }
}

/// Content of a present field: one value, or an ordered non-empty list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Single(Value),
    List(Vec<Value>),
}

impl FieldValue {
    pub fn values(&self) -> &[Value] {
        match self {
            FieldValue::Single(value) => std::slice::from_ref(value),
            FieldValue::List(values) => values,
        }
    }

    pub fn single(&self) -> Option<&Value> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::List(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(_) => false,
            FieldValue::List(values) => values.is_empty(),
        }
    }
}
