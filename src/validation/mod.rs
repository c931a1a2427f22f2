//! Structural validation of built elements.
//!
//! Validation is a pure function of the element, its schema and an optional
//! terminology service. Findings are returned as a [`ValidationResult`];
//! nothing here fails with an error. The structural pass runs as a
//! [`Visitor`] over the element tree, collecting per-field findings under
//! dot-joined paths such as `compose.include.filter`.

pub mod binding;
pub mod primitive;
pub mod reference;

use futures::future::join_all;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::terminology::{TerminologyError, TerminologyService};
use crate::types::{
    BindingInfo, BindingStrength, Element, FieldDescriptor, FieldValue, REFERENCE_KIND, Value,
};
use crate::visitor::{Visitor, traverse};
use binding::CodedValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must hold; the element does not conform.
    Rule,
    /// Should hold; non-fatal.
    Warning,
    /// Advisory only (preferred and example bindings).
    Information,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Rule => "rule",
            Severity::Warning => "warning",
            Severity::Information => "information",
        };
        f.write_str(text)
    }
}

/// Issue codes for element validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    /// ELM1001: Required field missing or empty
    Required = 1001,
    /// ELM1002: ele-1, element has neither value nor children
    EmptyElement = 1002,
    /// ELM1003: Value kind not declared for the field
    ChoiceType = 1003,
    /// ELM1004: Reference target type not allowed
    ReferenceType = 1004,
    /// ELM1005: Reference literal cannot be parsed
    InvalidReference = 1005,
    /// ELM1006: Code not in the bound value set
    Binding = 1006,
    /// ELM1007: Primitive value has an invalid lexical form
    PrimitiveFormat = 1007,
    /// ELM1008: Binding could not be checked
    BindingNotChecked = 1008,
    /// ELM1009: Single value stored in a list field or vice versa
    Cardinality = 1009,
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ELM{:04}", *self as u32)
    }
}

impl Serialize for IssueCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub path: String,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn rule(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Rule, code, path, message)
    }

    pub fn warning(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, path, message)
    }

    pub fn is_rule(&self) -> bool {
        self.severity == Severity::Rule
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {}: {}",
            self.code, self.severity, self.path, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
    pub is_valid: bool,
    pub rule_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::from_issues(Vec::new())
    }
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let count = |severity| issues.iter().filter(|i| i.severity == severity).count();
        let rule_count = count(Severity::Rule);
        let warning_count = count(Severity::Warning);
        let info_count = count(Severity::Information);

        Self {
            is_valid: rule_count == 0,
            rule_count,
            warning_count,
            info_count,
            issues,
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        let mut issues = std::mem::take(&mut self.issues);
        issues.extend(other.issues);
        *self = Self::from_issues(issues);
    }

    pub fn has_rule_violations(&self) -> bool {
        self.rule_count > 0
    }

    pub fn rule_violations(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_rule())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }

    pub fn issues_at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.path == path)
    }
}

/// Severity of a negative membership answer at `strength`.
fn binding_severity(strength: BindingStrength) -> Severity {
    if strength.is_error_on_failure() {
        Severity::Rule
    } else if strength.is_warning_on_failure() {
        Severity::Warning
    } else {
        Severity::Information
    }
}

/// A binding whose membership has to be decided by the terminology service.
#[derive(Debug, Clone)]
struct PendingBinding {
    path: String,
    field: String,
    binding: BindingInfo,
    candidates: Vec<CodedValue>,
}

impl PendingBinding {
    fn not_checked(&self, reason: &str) -> ValidationIssue {
        let severity = match self.binding.strength {
            BindingStrength::Required | BindingStrength::Extensible => Severity::Warning,
            BindingStrength::Preferred | BindingStrength::Example => Severity::Information,
        };
        ValidationIssue::new(
            severity,
            IssueCode::BindingNotChecked,
            &self.path,
            format!(
                "{}: binding to {} not checked: {}",
                self.field, self.binding.value_set, reason
            ),
        )
    }

    fn violation(&self) -> ValidationIssue {
        binding_violation(&self.path, &self.field, &self.binding, &self.candidates)
    }
}

fn binding_violation(
    path: &str,
    field: &str,
    binding: &BindingInfo,
    candidates: &[CodedValue],
) -> ValidationIssue {
    ValidationIssue::new(
        binding_severity(binding.strength),
        IssueCode::Binding,
        path,
        format!(
            "{}: '{}' is not a valid code for value set '{}' ({} binding)",
            field,
            binding::describe(candidates),
            binding.value_set,
            binding.strength
        ),
    )
}

/// Validates elements against their schemas.
#[derive(Clone, Default)]
pub struct Validator {
    config: ModelConfig,
    terminology: Option<Arc<dyn TerminologyService>>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("has_terminology", &self.terminology.is_some())
            .finish()
    }
}

impl Validator {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            terminology: None,
        }
    }

    pub fn with_terminology(mut self, service: Arc<dyn TerminologyService>) -> Self {
        self.terminology = Some(service);
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn has_terminology(&self) -> bool {
        self.terminology.is_some()
    }

    /// Synchronous validation. Bindings that need the terminology service are
    /// reported as not checked.
    pub fn validate(&self, element: &Element) -> ValidationResult {
        let (mut issues, pending) = self.structural_pass(element);
        let reason = if self.terminology.is_some() {
            "terminology checks require asynchronous validation"
        } else {
            "no terminology service configured"
        };
        issues.extend(pending.iter().map(|p| p.not_checked(reason)));
        ValidationResult::from_issues(issues)
    }

    /// Validation that consults the terminology service for pending bindings,
    /// each call bounded by the configured timeout.
    pub async fn validate_async(&self, element: &Element) -> ValidationResult {
        let (mut issues, pending) = self.structural_pass(element);

        match &self.terminology {
            None => {
                issues.extend(
                    pending
                        .iter()
                        .map(|p| p.not_checked("no terminology service configured")),
                );
            }
            Some(service) => {
                let timeout = self.config.terminology.timeout;
                let checks = pending
                    .iter()
                    .map(|p| check_pending(service.as_ref(), p, timeout));
                issues.extend(join_all(checks).await.into_iter().flatten());
            }
        }

        ValidationResult::from_issues(issues)
    }

    fn structural_pass(&self, element: &Element) -> (Vec<ValidationIssue>, Vec<PendingBinding>) {
        let mut visitor = StructuralVisitor {
            config: &self.config,
            path: Vec::new(),
            issues: Vec::new(),
            pending: Vec::new(),
        };
        let outcome = traverse(element, &mut visitor);
        debug!(
            type_name = element.type_name(),
            nodes = outcome.nodes_visited,
            issues = visitor.issues.len(),
            pending_bindings = visitor.pending.len(),
            "Structural validation complete"
        );
        (visitor.issues, visitor.pending)
    }
}

/// Candidate codes are checked concurrently, so a binding costs at most one `timeout`.
async fn check_pending(
    service: &dyn TerminologyService,
    pending: &PendingBinding,
    timeout: Duration,
) -> Option<ValidationIssue> {
    let calls = pending.candidates.iter().map(|candidate| {
        tokio::time::timeout(
            timeout,
            service.check_membership(
                &candidate.code,
                candidate.system.as_deref(),
                &pending.binding.value_set,
                pending.binding.strength,
            ),
        )
    });

    let mut failure = None;
    for outcome in join_all(calls).await {
        match outcome {
            Ok(Ok(result)) if result.member => return None,
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!(
                    value_set = %pending.binding.value_set,
                    code = %e.code(),
                    "Terminology check failed: {}",
                    e
                );
                failure = Some(e.to_string());
            }
            Err(_) => {
                let e = TerminologyError::Timeout(timeout);
                warn!(value_set = %pending.binding.value_set, "{}", e);
                failure = Some(e.to_string());
            }
        }
    }

    Some(match failure {
        Some(reason) => pending.not_checked(&reason),
        None => pending.violation(),
    })
}

struct StructuralVisitor<'a> {
    config: &'a ModelConfig,
    path: Vec<String>,
    issues: Vec<ValidationIssue>,
    pending: Vec<PendingBinding>,
}

impl StructuralVisitor<'_> {
    fn rule_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_rule()).count()
    }

    fn check_element(&mut self, path: &str, element: &Element, is_root: bool) {
        let rules_before = self.rule_count();

        for (descriptor, slot) in element.schema().fields().iter().zip(element.field_slots()) {
            let field_path = format!("{}.{}", path, descriptor.name);
            match slot {
                None => {
                    if descriptor.is_required() {
                        self.issues.push(ValidationIssue::rule(
                            IssueCode::Required,
                            field_path,
                            format!("{} must be present", descriptor.name),
                        ));
                    }
                }
                Some(value) => self.check_field(&field_path, descriptor, value),
            }
        }

        // ele-1 applies below the root and never to resources
        if !is_root
            && !element.is_resource()
            && !element.has_value_or_children()
            && self.rule_count() == rules_before
        {
            self.issues.push(ValidationIssue::rule(
                IssueCode::EmptyElement,
                path,
                "ele-1: All FHIR elements must have a @value or children",
            ));
        }
    }

    fn check_field(&mut self, path: &str, field: &FieldDescriptor, value: &FieldValue) {
        match value {
            FieldValue::List(values) if !field.is_list() => {
                self.issues.push(ValidationIssue::rule(
                    IssueCode::Cardinality,
                    path,
                    format!("{} is single-valued but holds {} values", field.name, values.len()),
                ));
            }
            FieldValue::List(values) if values.is_empty() => {
                if field.is_required() {
                    self.issues.push(ValidationIssue::rule(
                        IssueCode::Required,
                        path,
                        format!("{} must be present", field.name),
                    ));
                }
                return;
            }
            FieldValue::Single(_) if field.is_list() => {
                self.issues.push(ValidationIssue::rule(
                    IssueCode::Cardinality,
                    path,
                    format!("{} is list-valued but holds a single value", field.name),
                ));
            }
            _ => {}
        }

        for item in value.values() {
            if !field.accepts(item) {
                let message = if field.is_choice() {
                    format!(
                        "Invalid type: {} for choice element: '{}' must be one of: {}",
                        item.kind(),
                        field.name,
                        field.kinds_display()
                    )
                } else {
                    format!(
                        "Invalid type: {} for element: '{}' must be: {}",
                        item.kind(),
                        field.name,
                        field.kinds_display()
                    )
                };
                self.issues
                    .push(ValidationIssue::rule(IssueCode::ChoiceType, path, message));
                continue;
            }

            if self.config.check_reference_types && field.is_reference() {
                let reference = item
                    .as_element()
                    .filter(|e| e.type_name() == REFERENCE_KIND);
                if let Some(reference) = reference {
                    if let Some((code, message)) =
                        reference::check_reference_target(reference, field)
                    {
                        self.issues.push(ValidationIssue::rule(code, path, message));
                    }
                }
            }

            if let Some(binding) = &field.binding {
                self.check_binding(path, field, binding, item);
            }

            if self.config.check_primitive_values {
                if let Value::Primitive(primitive) = item {
                    if let Some(message) = primitive::check_primitive(primitive, self.config) {
                        self.issues.push(ValidationIssue::rule(
                            IssueCode::PrimitiveFormat,
                            path,
                            format!("{}: {}", field.name, message),
                        ));
                    }
                }
            }
        }
    }

    fn check_binding(
        &mut self,
        path: &str,
        field: &FieldDescriptor,
        binding: &BindingInfo,
        value: &Value,
    ) {
        if binding.strength == BindingStrength::Example && !self.config.check_example_bindings {
            return;
        }

        let candidates = binding::coded_values(value);
        if candidates.is_empty() {
            return;
        }

        if binding.is_enumerated() {
            if !binding::is_enumerated_member(binding, &candidates) {
                self.issues
                    .push(binding_violation(path, &field.name, binding, &candidates));
            }
            return;
        }

        self.pending.push(PendingBinding {
            path: path.to_string(),
            field: field.name.clone(),
            binding: binding.clone(),
            candidates,
        });
    }
}

impl Visitor for StructuralVisitor<'_> {
    fn enter(&mut self, name: &str, _index: Option<usize>, element: &Element) -> bool {
        self.path.push(name.to_string());
        let path = self.path.join(".");
        let is_root = self.path.len() == 1;
        self.check_element(&path, element, is_root);
        true
    }

    fn leave(&mut self, _name: &str, _index: Option<usize>, _element: &Element) {
        self.path.pop();
    }
}
