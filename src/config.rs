use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{FhirElementError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Check declared reference targets against the allowed types.
    pub check_reference_types: bool,
    /// Check lexical forms of primitive values.
    pub check_primitive_values: bool,
    /// Reject control characters in string values (part of the primitive checks).
    pub check_control_characters: bool,
    /// Also check example-strength bindings (advisory results only).
    pub check_example_bindings: bool,
    /// Reject elements with rule violations when a model finishes a builder.
    pub strict_build: bool,
    pub terminology: TerminologyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminologyConfig {
    /// Upper bound on a single membership call.
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_max_size: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            check_reference_types: true,
            check_primitive_values: true,
            check_control_characters: true,
            check_example_bindings: false,
            strict_build: false,
            terminology: TerminologyConfig::default(),
        }
    }
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(3600), // 1 hour
            cache_max_size: 10_000,
        }
    }
}

impl ModelConfig {
    pub fn strict() -> Self {
        Self {
            strict_build: true,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FhirElementError::config(format!("Invalid model configuration: {e}")))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn with_reference_checks(mut self, enabled: bool) -> Self {
        self.check_reference_types = enabled;
        self
    }

    pub fn with_primitive_checks(mut self, enabled: bool) -> Self {
        self.check_primitive_values = enabled;
        self
    }

    pub fn with_control_character_checks(mut self, enabled: bool) -> Self {
        self.check_control_characters = enabled;
        self
    }

    pub fn with_example_bindings(mut self, enabled: bool) -> Self {
        self.check_example_bindings = enabled;
        self
    }

    pub fn with_strict_build(mut self, enabled: bool) -> Self {
        self.strict_build = enabled;
        self
    }

    pub fn with_terminology_timeout(mut self, timeout: Duration) -> Self {
        self.terminology.timeout = timeout;
        self
    }

    pub fn with_terminology_cache(mut self, ttl: Duration, max_size: u64) -> Self {
        self.terminology.cache_ttl = ttl;
        self.terminology.cache_max_size = max_size;
        self
    }
}
