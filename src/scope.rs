//! Scope sets and per-action scope requirements.
//!
//! A [`ScopeSet`] is an unordered collection of scope names with set-based
//! membership and subset queries. An [`AuthorizationRequirement`] is the
//! at-most-one scope a guarded action declares at configuration time.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// An unordered set of OAuth scope names.
///
/// Comparison is exact-string and case-sensitive. The empty set is valid and
/// means "no scopes granted" (or required, depending on which side it sits).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet {
    scopes: HashSet<String>,
}

impl ScopeSet {
    /// Create an empty scope set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the RFC 6749 space-delimited scope string form.
    ///
    /// ```rust
    /// use tower_oauth_guard::ScopeSet;
    ///
    /// let scope = ScopeSet::from_delimited("read write");
    /// assert!(scope.contains("read"));
    /// assert!(scope.contains("write"));
    /// assert_eq!(scope.len(), 2);
    /// ```
    pub fn from_delimited(scope: &str) -> Self {
        scope.split_whitespace().map(String::from).collect()
    }

    /// Check whether a scope is a member of this set.
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Check whether every scope in this set is also in `other`.
    pub fn is_subset(&self, other: &ScopeSet) -> bool {
        self.scopes.is_subset(&other.scopes)
    }

    /// Returns true if no scopes are present.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Number of scopes in the set.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Iterate over the scope names in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            scopes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// The scope requirement a guarded action declares at configuration time.
///
/// `None` means "no scope required": any authenticated credential passes,
/// whatever its scope set contains. Immutable once declared.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationRequirement {
    required: Option<String>,
}

impl AuthorizationRequirement {
    /// Require authentication only, no particular scope.
    pub fn none() -> Self {
        Self::default()
    }

    /// Require authentication plus membership of the given scope.
    pub fn scope(scope: impl Into<String>) -> Self {
        Self {
            required: Some(scope.into()),
        }
    }

    /// The required scope, if one was declared.
    pub fn required_scope(&self) -> Option<&str> {
        self.required.as_deref()
    }
}
