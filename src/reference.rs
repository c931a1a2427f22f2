//! Reference literals and the reference resolver collaborator.
//!
//! The element model never dereferences a reference. [`parse_reference`]
//! classifies a literal so the validator can compare its declared resource
//! type with the allowed targets; resolving a reference to another element is
//! left to a [`ReferenceResolver`] supplied by the host application.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::types::Element;

/// Error codes for reference handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceErrorCode {
    /// REF1001: Referenced resource does not exist
    NonExistentResource = 1001,
    /// REF1002: Contained reference not found
    ContainedNotFound = 1002,
    /// REF1003: Reference service unavailable
    ServiceUnavailable = 1003,
    /// REF1004: Invalid reference format
    InvalidReferenceFormat = 1004,
    /// REF1005: Resolved resource has a type outside the allowed set
    DisallowedTargetType = 1005,
}

impl fmt::Display for ReferenceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REF{:04}", *self as u32)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReferenceError {
    #[error("Referenced resource {resource_type}/{id} does not exist")]
    NonExistentResource { resource_type: String, id: String },

    #[error("Contained reference #{id} not found in resource")]
    ContainedNotFound { id: String },

    #[error("Reference resolution service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Invalid reference format: {reference}")]
    InvalidReferenceFormat { reference: String },

    #[error("Resource type {resource_type} must be one of: {allowed:?}")]
    DisallowedTargetType {
        resource_type: String,
        allowed: Vec<String>,
    },
}

impl ReferenceError {
    pub fn code(&self) -> ReferenceErrorCode {
        match self {
            ReferenceError::NonExistentResource { .. } => ReferenceErrorCode::NonExistentResource,
            ReferenceError::ContainedNotFound { .. } => ReferenceErrorCode::ContainedNotFound,
            ReferenceError::ServiceUnavailable { .. } => ReferenceErrorCode::ServiceUnavailable,
            ReferenceError::InvalidReferenceFormat { .. } => {
                ReferenceErrorCode::InvalidReferenceFormat
            }
            ReferenceError::DisallowedTargetType { .. } => {
                ReferenceErrorCode::DisallowedTargetType
            }
        }
    }
}

pub type ReferenceResult<T> = Result<T, ReferenceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `#id`, pointing into the enclosing resource's `contained`
    Contained,
    /// Literal with a URI scheme (`urn:uuid:..`, `http://..`)
    Absolute,
    /// `Type?search-params`
    Conditional,
    /// `Type/id` with an optional `/_history/vid`
    Relative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub kind: ReferenceKind,
    pub resource_type: Option<String>,
    pub id: Option<String>,
    pub version: Option<String>,
}

impl ParsedReference {
    fn untyped(kind: ReferenceKind, id: Option<String>) -> Self {
        Self {
            kind,
            resource_type: None,
            id,
            version: None,
        }
    }
}

static RELATIVE_REFERENCE: OnceCell<Regex> = OnceCell::new();

/// Group 4 is the resource type, 5 the id, 7 the history version.
fn relative_reference_pattern() -> Result<&'static Regex, regex::Error> {
    RELATIVE_REFERENCE.get_or_try_init(|| {
        Regex::new(
            r"^((http|https)://([A-Za-z0-9\-\\.:%$]*/)+)?([A-Z][A-Za-z]+)/([A-Za-z0-9\-.]{1,64})(/_history/([A-Za-z0-9\-.]{1,64}))?$",
        )
    })
}

/// True if the literal has a URI scheme (a prefix followed by ':') and a non-empty value.
pub fn has_scheme(literal: &str) -> bool {
    literal
        .find(':')
        .is_some_and(|index| index > 0 && literal.len() > index + 1)
}

/// Classify a literal reference and extract its resource type where it carries one.
pub fn parse_reference(literal: &str) -> ReferenceResult<ParsedReference> {
    let invalid = || ReferenceError::InvalidReferenceFormat {
        reference: literal.to_string(),
    };

    if let Some(id) = literal.strip_prefix('#') {
        return Ok(ParsedReference::untyped(
            ReferenceKind::Contained,
            (!id.is_empty()).then(|| id.to_string()),
        ));
    }
    if has_scheme(literal) {
        return Ok(ParsedReference::untyped(ReferenceKind::Absolute, None));
    }
    if let Some((resource_type, _)) = literal.split_once('?') {
        if resource_type.is_empty() {
            return Err(invalid());
        }
        return Ok(ParsedReference {
            kind: ReferenceKind::Conditional,
            resource_type: Some(resource_type.to_string()),
            id: None,
            version: None,
        });
    }

    let pattern = relative_reference_pattern().map_err(|_| invalid())?;
    let captures = pattern.captures(literal).ok_or_else(invalid)?;
    let group = |index: usize| captures.get(index).map(|m| m.as_str().to_string());
    Ok(ParsedReference {
        kind: ReferenceKind::Relative,
        resource_type: group(4),
        id: group(5),
        version: group(7),
    })
}

/// Result of resolving a reference
#[derive(Debug, Clone)]
pub struct ReferenceResolutionResult {
    pub exists: bool,
    pub resource_type: Option<String>,
    pub id: Option<String>,
    /// The resolved resource, when the resolver holds it.
    pub element: Option<Element>,
}

impl ReferenceResolutionResult {
    pub fn found(element: Element, id: String) -> Self {
        Self {
            exists: true,
            resource_type: Some(element.type_name().to_string()),
            id: Some(id),
            element: Some(element),
        }
    }

    pub fn not_found() -> Self {
        Self {
            exists: false,
            resource_type: None,
            id: None,
            element: None,
        }
    }

    /// Resolution was not attempted (e.g. absolute references)
    pub fn skipped() -> Self {
        Self {
            exists: true, // Assume exists when skipped
            resource_type: None,
            id: None,
            element: None,
        }
    }
}

/// Resolves reference literals to resources held by the host application.
///
/// `allowed_types` is the target set declared on the referencing field; an
/// empty slice means any type.
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn resource_exists(&self, resource_type: &str, id: &str) -> ReferenceResult<bool>;

    async fn resolve(
        &self,
        reference: &str,
        allowed_types: &[String],
    ) -> ReferenceResult<ReferenceResolutionResult>;
}

/// A resolver that never dereferences and reports every reference as existing.
#[derive(Debug, Default, Clone)]
pub struct NoOpReferenceResolver;

impl NoOpReferenceResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReferenceResolver for NoOpReferenceResolver {
    async fn resource_exists(&self, _resource_type: &str, _id: &str) -> ReferenceResult<bool> {
        Ok(true)
    }

    async fn resolve(
        &self,
        _reference: &str,
        _allowed_types: &[String],
    ) -> ReferenceResult<ReferenceResolutionResult> {
        Ok(ReferenceResolutionResult::skipped())
    }
}

/// Resources kept in memory, keyed by `Type/id`.
#[derive(Debug, Default)]
pub struct InMemoryReferenceResolver {
    resources: HashMap<(String, String), Element>,
}

impl InMemoryReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resource under its type and `id` field; returns false if it has no id.
    pub fn insert(&mut self, resource: Element) -> bool {
        let Some(id) = resource.value("id").and_then(|v| v.as_str()).map(str::to_string) else {
            return false;
        };
        self.resources
            .insert((resource.type_name().to_string(), id), resource);
        true
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[async_trait]
impl ReferenceResolver for InMemoryReferenceResolver {
    async fn resource_exists(&self, resource_type: &str, id: &str) -> ReferenceResult<bool> {
        Ok(self
            .resources
            .contains_key(&(resource_type.to_string(), id.to_string())))
    }

    async fn resolve(
        &self,
        reference: &str,
        allowed_types: &[String],
    ) -> ReferenceResult<ReferenceResolutionResult> {
        let parsed = parse_reference(reference)?;
        let (Some(resource_type), Some(id)) = (parsed.resource_type, parsed.id) else {
            return Ok(ReferenceResolutionResult::skipped());
        };

        if !allowed_types.is_empty() && !allowed_types.contains(&resource_type) {
            return Err(ReferenceError::DisallowedTargetType {
                resource_type,
                allowed: allowed_types.to_vec(),
            });
        }

        match self.resources.get(&(resource_type, id.clone())) {
            Some(element) => Ok(ReferenceResolutionResult::found(element.clone(), id)),
            None => Ok(ReferenceResolutionResult::not_found()),
        }
    }
}
