//! Terminology collaborator for binding checks.
//!
//! The element model only describes terminology; deciding whether a code is a
//! member of a value set is delegated to a [`TerminologyService`]. The
//! validator calls it through a timeout and degrades any failure to a
//! "binding not checked" warning.
//!
//! - `TerminologyService` trait defines the interface
//! - `CachedTerminologyService` wraps any service with TTL-based caching
//! - `InMemoryTerminologyService` holds fixed value sets for tests and offline use

use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::TerminologyConfig;
use crate::types::BindingStrength;

/// Error codes for terminology/binding validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminologyErrorCode {
    /// VS1001: Value set not found
    ValueSetNotFound = 1001,
    /// VS1002: Terminology service unavailable
    ServiceUnavailable = 1002,
    /// VS1003: Call exceeded its time budget
    Timeout = 1003,
    /// VS1004: Internal service failure
    Internal = 1004,
}

impl std::fmt::Display for TerminologyErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VS{:04}", *self as u32)
    }
}

#[derive(Debug, Clone, Error)]
pub enum TerminologyError {
    #[error("Value set not found: {url}")]
    ValueSetNotFound { url: String },

    #[error("Terminology service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Terminology call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TerminologyError {
    pub fn code(&self) -> TerminologyErrorCode {
        match self {
            TerminologyError::ValueSetNotFound { .. } => TerminologyErrorCode::ValueSetNotFound,
            TerminologyError::Unavailable { .. } => TerminologyErrorCode::ServiceUnavailable,
            TerminologyError::Timeout(_) => TerminologyErrorCode::Timeout,
            TerminologyError::Internal(_) => TerminologyErrorCode::Internal,
        }
    }
}

pub type TerminologyResult<T> = Result<T, TerminologyError>;

/// Answer to a membership question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipResult {
    pub member: bool,
    pub display: Option<String>,
    pub message: Option<String>,
}

impl MembershipResult {
    pub fn member() -> Self {
        Self {
            member: true,
            display: None,
            message: None,
        }
    }

    pub fn member_with_display(display: String) -> Self {
        Self {
            member: true,
            display: Some(display),
            message: None,
        }
    }

    pub fn not_member() -> Self {
        Self {
            member: false,
            display: None,
            message: None,
        }
    }
}

/// Decides value-set membership for coded values.
///
/// Implementations may call a FHIR terminology server, a local database, or
/// fixed in-memory value sets. The validator never retries; retry policy
/// belongs to the implementation.
#[async_trait]
pub trait TerminologyService: Send + Sync {
    async fn check_membership(
        &self,
        code: &str,
        system: Option<&str>,
        value_set: &str,
        strength: BindingStrength,
    ) -> TerminologyResult<MembershipResult>;

    async fn value_set_exists(&self, value_set: &str) -> TerminologyResult<bool> {
        let _ = value_set;
        Ok(true)
    }
}

/// Cache key for terminology lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    value_set: String,
    code: String,
    system: Option<String>,
}

/// A cached wrapper around a TerminologyService.
///
/// Only successful answers are cached; errors are passed through so a
/// recovering service is consulted again.
pub struct CachedTerminologyService {
    inner: Arc<dyn TerminologyService>,
    cache: Cache<CacheKey, MembershipResult>,
}

impl CachedTerminologyService {
    pub fn new(inner: Arc<dyn TerminologyService>, config: &TerminologyConfig) -> Self {
        let cache = Cache::builder()
            .time_to_live(config.cache_ttl)
            .max_capacity(config.cache_max_size)
            .build();

        Self { inner, cache }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.cache.entry_count(),
            weighted_size: self.cache.weighted_size(),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entry_count: u64,
    pub weighted_size: u64,
}

#[async_trait]
impl TerminologyService for CachedTerminologyService {
    async fn check_membership(
        &self,
        code: &str,
        system: Option<&str>,
        value_set: &str,
        strength: BindingStrength,
    ) -> TerminologyResult<MembershipResult> {
        let key = CacheKey {
            value_set: value_set.to_string(),
            code: code.to_string(),
            system: system.map(|s| s.to_string()),
        };

        if let Some(result) = self.cache.get(&key).await {
            return Ok(result);
        }

        let result = self
            .inner
            .check_membership(code, system, value_set, strength)
            .await?;
        self.cache.insert(key, result.clone()).await;
        Ok(result)
    }

    async fn value_set_exists(&self, value_set: &str) -> TerminologyResult<bool> {
        self.inner.value_set_exists(value_set).await
    }
}

/// Type alias for code map: (code, system) -> display
type CodeMap = HashMap<(String, Option<String>), Option<String>>;

/// Fixed value sets held in memory.
#[derive(Debug, Default)]
pub struct InMemoryTerminologyService {
    value_sets: HashMap<String, CodeMap>,
}

impl InMemoryTerminologyService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_code(
        &mut self,
        value_set: &str,
        code: &str,
        system: Option<&str>,
        display: Option<&str>,
    ) {
        self.value_sets
            .entry(value_set.to_string())
            .or_default()
            .insert(
                (code.to_string(), system.map(|s| s.to_string())),
                display.map(|d| d.to_string()),
            );
    }

    pub fn add_codes(&mut self, value_set: &str, system: Option<&str>, codes: &[&str]) {
        for code in codes {
            self.add_code(value_set, code, system, None);
        }
    }
}

#[async_trait]
impl TerminologyService for InMemoryTerminologyService {
    async fn check_membership(
        &self,
        code: &str,
        system: Option<&str>,
        value_set: &str,
        _strength: BindingStrength,
    ) -> TerminologyResult<MembershipResult> {
        let Some(codes) = self.value_sets.get(value_set) else {
            return Err(TerminologyError::ValueSetNotFound {
                url: value_set.to_string(),
            });
        };

        let exact = codes.get(&(code.to_string(), system.map(|s| s.to_string())));
        // Codes registered without a system match any system, and vice versa.
        let loose = || {
            codes
                .iter()
                .find(|((c, s), _)| c == code && (s.is_none() || system.is_none()))
                .map(|(_, display)| display)
        };

        Ok(match exact.or_else(loose) {
            Some(Some(display)) => MembershipResult::member_with_display(display.clone()),
            Some(None) => MembershipResult::member(),
            None => MembershipResult::not_member(),
        })
    }

    async fn value_set_exists(&self, value_set: &str) -> TerminologyResult<bool> {
        Ok(self.value_sets.contains_key(value_set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENDER: &str = "http://hl7.org/fhir/ValueSet/administrative-gender";
    const GENDER_SYSTEM: &str = "http://hl7.org/fhir/administrative-gender";

    #[tokio::test]
    async fn test_in_memory_service() {
        let mut service = InMemoryTerminologyService::new();
        service.add_code(GENDER, "male", Some(GENDER_SYSTEM), Some("Male"));
        service.add_code(GENDER, "female", Some(GENDER_SYSTEM), Some("Female"));

        let result = service
            .check_membership("male", Some(GENDER_SYSTEM), GENDER, BindingStrength::Required)
            .await
            .unwrap();
        assert!(result.member);
        assert_eq!(result.display, Some("Male".to_string()));

        let result = service
            .check_membership("male", None, GENDER, BindingStrength::Required)
            .await
            .unwrap();
        assert!(result.member);

        let result = service
            .check_membership("unknown", Some(GENDER_SYSTEM), GENDER, BindingStrength::Required)
            .await
            .unwrap();
        assert!(!result.member);

        let err = service
            .check_membership("x", None, "http://example.org/missing", BindingStrength::Required)
            .await
            .unwrap_err();
        assert_eq!(err.code(), TerminologyErrorCode::ValueSetNotFound);
    }

    #[tokio::test]
    async fn test_cached_service() {
        let mut inner = InMemoryTerminologyService::new();
        inner.add_code("http://example.org/vs", "ABC", None, None);

        let cached = CachedTerminologyService::new(
            Arc::new(inner),
            &TerminologyConfig {
                cache_ttl: Duration::from_secs(60),
                cache_max_size: 100,
                ..Default::default()
            },
        );

        for _ in 0..2 {
            let result = cached
                .check_membership("ABC", None, "http://example.org/vs", BindingStrength::Required)
                .await
                .unwrap();
            assert!(result.member);
        }

        // moka is eventually consistent
        cached.cache.run_pending_tasks().await;
        assert_eq!(cached.cache_stats().entry_count, 1);

        cached.clear_cache();
        cached.cache.run_pending_tasks().await;
        assert_eq!(cached.cache_stats().entry_count, 0);
    }

    #[test]
    fn test_error_codes() {
        let err = TerminologyError::ValueSetNotFound {
            url: "http://example.org/vs".to_string(),
        };
        assert_eq!(format!("{}", err.code()), "VS1001");
        assert_eq!(
            TerminologyError::Timeout(Duration::from_millis(10)).code().to_string(),
            "VS1003"
        );
    }
}
