pub mod element;
pub mod schema;
pub mod value;

pub use element::Element;
pub use schema::{
    BindingInfo, BindingStrength, Cardinality, ElementSchema, FieldDescriptor, PrimitiveKind,
    REFERENCE_KIND, RESOURCE_KIND, SchemaDefinition, SchemaKind, ValueKind,
};
pub use value::{FieldValue, Primitive, PrimitiveValue, Value};
