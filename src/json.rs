//! FHIR JSON encoding of elements.
//!
//! Encoding is a [`Visitor`] over the element tree. Field order follows the
//! schema, choice fields are keyed `name + TypeSuffix` and resources lead with
//! `resourceType`. Decimals keep their lexical form in both directions.

use serde_json::{Map, Number, Value as JsonValue};
use std::sync::Arc;
use tracing::debug;

use crate::error::{FhirElementError, Result};
use crate::registry::SchemaRegistry;
use crate::types::{
    Element, ElementSchema, Primitive, PrimitiveKind, PrimitiveValue, RESOURCE_KIND, Value,
    ValueKind,
};
use crate::visitor::{Visitor, traverse};

pub const RESOURCE_TYPE_KEY: &str = "resourceType";

/// Encode `element` as a FHIR JSON object.
pub fn to_json(element: &Element) -> JsonValue {
    let mut writer = JsonWriter::default();
    traverse(element, &mut writer);
    writer.result.unwrap_or_else(|| JsonValue::Object(Map::new()))
}

pub fn to_json_string(element: &Element) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_json(element))?)
}

#[derive(Default)]
struct JsonWriter {
    objects: Vec<(Arc<ElementSchema>, Map<String, JsonValue>)>,
    lists: Vec<Vec<JsonValue>>,
    result: Option<JsonValue>,
}

impl JsonWriter {
    fn place(&mut self, name: &str, index: Option<usize>, kind: ValueKind, value: JsonValue) {
        if index.is_some() {
            if let Some(list) = self.lists.last_mut() {
                list.push(value);
            }
            return;
        }
        match self.objects.last_mut() {
            Some((schema, map)) => {
                let key = match schema.field(name) {
                    Some(field) if field.is_choice() => {
                        format!("{}{}", name, kind.choice_suffix())
                    }
                    _ => name.to_string(),
                };
                map.insert(key, value);
            }
            None => self.result = Some(value),
        }
    }
}

impl Visitor for JsonWriter {
    fn enter(&mut self, _name: &str, _index: Option<usize>, element: &Element) -> bool {
        let mut map = Map::new();
        if element.is_resource() {
            map.insert(
                RESOURCE_TYPE_KEY.to_string(),
                JsonValue::String(element.type_name().to_string()),
            );
        }
        self.objects.push((Arc::clone(element.schema()), map));
        true
    }

    fn leave(&mut self, name: &str, index: Option<usize>, element: &Element) {
        if let Some((_, map)) = self.objects.pop() {
            let kind = ValueKind::Element(element.type_name().to_string());
            self.place(name, index, kind, JsonValue::Object(map));
        }
    }

    fn enter_list(&mut self, _name: &str, values: &[Value]) {
        self.lists.push(Vec::with_capacity(values.len()));
    }

    fn leave_list(&mut self, name: &str, _values: &[Value]) {
        if let (Some(list), Some((_, map))) = (self.lists.pop(), self.objects.last_mut()) {
            map.insert(name.to_string(), JsonValue::Array(list));
        }
    }

    fn visit_primitive(&mut self, name: &str, index: Option<usize>, primitive: &Primitive) {
        let value = primitive_to_json(primitive);
        self.place(name, index, ValueKind::Primitive(primitive.kind()), value);
    }
}

fn primitive_to_json(primitive: &Primitive) -> JsonValue {
    match primitive.value() {
        PrimitiveValue::Boolean(value) => JsonValue::Bool(*value),
        PrimitiveValue::Integer(value) => JsonValue::Number(Number::from(*value)),
        PrimitiveValue::Text(text) if primitive.kind() == PrimitiveKind::Decimal => {
            match serde_json::from_str::<Number>(text) {
                Ok(number) => JsonValue::Number(number),
                Err(_) => JsonValue::String(text.to_string()),
            }
        }
        PrimitiveValue::Text(text) => JsonValue::String(text.to_string()),
    }
}

/// Decode a resource, taking its type from `resourceType`.
pub fn resource_from_json(registry: &SchemaRegistry, json: &JsonValue) -> Result<Element> {
    let type_name = resource_type_of(json, "$")?;
    if !registry.is_resource_type(type_name) {
        return Err(FhirElementError::decode(
            "$",
            format!("'{}' is not a resource type", type_name),
        ));
    }
    from_json(registry, type_name, json)
}

pub fn resource_from_str(registry: &SchemaRegistry, json: &str) -> Result<Element> {
    let value: JsonValue = serde_json::from_str(json)?;
    resource_from_json(registry, &value)
}

/// Decode `json` as an element of `type_name`.
///
/// Keys starting with `_` (primitive extensions) are skipped; any other key the
/// schema does not declare is an error.
pub fn from_json(registry: &SchemaRegistry, type_name: &str, json: &JsonValue) -> Result<Element> {
    let path = registry.get(type_name)?.path().to_string();
    decode_element(registry, type_name, json, &path)
}

fn decode_element(
    registry: &SchemaRegistry,
    type_name: &str,
    json: &JsonValue,
    path: &str,
) -> Result<Element> {
    let object = json
        .as_object()
        .ok_or_else(|| FhirElementError::decode(path, format!("expected a {} object", type_name)))?;
    let mut builder = registry.builder(type_name)?;
    let is_resource = builder.schema().kind().is_resource();

    for (key, value) in object {
        if key == RESOURCE_TYPE_KEY && is_resource {
            if value.as_str() != Some(type_name) {
                return Err(FhirElementError::decode(
                    path,
                    format!("resourceType {} does not match {}", value, type_name),
                ));
            }
            continue;
        }
        if key.starts_with('_') {
            debug!(path, key = key.as_str(), "Skipping primitive extension key");
            continue;
        }

        let schema = Arc::clone(builder.schema());
        let (field, choice_kind) = schema.field_for_key(key).ok_or_else(|| {
            FhirElementError::decode(path, format!("unknown element '{}'", key))
        })?;
        let kind = match choice_kind {
            Some(kind) => kind,
            None => field.value_kinds.first().ok_or_else(|| {
                FhirElementError::invalid_schema(type_name, format!("field '{}' has no kinds", field.name))
            })?,
        };
        let field_path = format!("{}.{}", path, field.name);

        if field.is_list() {
            let items = value.as_array().ok_or_else(|| {
                FhirElementError::decode(&field_path, "expected an array")
            })?;
            let mut values = Vec::with_capacity(items.len());
            for (position, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", field_path, position);
                values.push(decode_value(registry, kind, item, &item_path)?);
            }
            builder.add_all(&field.name, values)?;
        } else {
            let value = decode_value(registry, kind, value, &field_path)?;
            builder.set(&field.name, value)?;
        }
    }

    Ok(builder.build())
}

fn decode_value(
    registry: &SchemaRegistry,
    kind: &ValueKind,
    json: &JsonValue,
    path: &str,
) -> Result<Value> {
    match kind {
        ValueKind::Primitive(kind) => decode_primitive(*kind, json, path).map(Value::Primitive),
        ValueKind::Element(name) if name == RESOURCE_KIND => {
            let type_name = resource_type_of(json, path)?;
            if !registry.is_resource_type(type_name) {
                return Err(FhirElementError::decode(
                    path,
                    format!("'{}' is not a resource type", type_name),
                ));
            }
            decode_element(registry, type_name, json, path).map(Value::Element)
        }
        ValueKind::Element(name) => decode_element(registry, name, json, path).map(Value::Element),
    }
}

fn decode_primitive(kind: PrimitiveKind, json: &JsonValue, path: &str) -> Result<Primitive> {
    let unexpected = || FhirElementError::decode(path, format!("expected a {} value, found {}", kind, json));

    if kind.is_boolean() {
        return json.as_bool().map(Primitive::boolean).ok_or_else(unexpected);
    }
    if kind.is_integer() {
        let value = json.as_i64().ok_or_else(unexpected)?;
        return Primitive::integral(kind, value);
    }
    match (kind, json) {
        (PrimitiveKind::Decimal, JsonValue::Number(number)) => {
            Primitive::text(kind, number.to_string())
        }
        (PrimitiveKind::Decimal, _) => Err(unexpected()),
        (_, JsonValue::String(text)) => Primitive::text(kind, text.as_str()),
        _ => Err(unexpected()),
    }
}

fn resource_type_of<'a>(json: &'a JsonValue, path: &str) -> Result<&'a str> {
    json.get(RESOURCE_TYPE_KEY)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| FhirElementError::decode(path, "missing resourceType"))
}
