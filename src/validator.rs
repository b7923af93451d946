//! The token validator boundary.
//!
//! The guard never inspects token contents itself. It hands the raw bearer
//! token to an implementation of [`ValidateToken`] -- the external
//! collaborator that owns token issuance, persistence, and verification --
//! and receives back either a [`TokenOutcome`] or a [`ValidatorFault`].
//!
//! A rejected token is a [`TokenOutcome::Invalid`], not an error: it is the
//! normal unauthenticated path. Only a failure of the validator itself (its
//! backing store unreachable, say) is a fault.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::ValidatorFault;
use crate::scope::ScopeSet;

/// Result of presenting a bearer token to the validator.
#[derive(Debug, Clone)]
pub enum TokenOutcome {
    /// The token is valid and resolves to a principal.
    Valid {
        /// Opaque identifier of the resource owner the token was issued for.
        resource: String,
        /// Scopes granted to the token.
        scope: ScopeSet,
    },
    /// The token was not accepted. This is the normal unauthenticated
    /// outcome, not an error.
    Invalid {
        /// Why the token was rejected, for diagnostic logging only.
        reason: String,
    },
}

/// Trait for the external token validator.
///
/// Implement this to plug in whatever owns your tokens: an OAuth server's
/// token store, an introspection endpoint, a session table. Validation may
/// perform I/O; the guard memoizes the result so it runs at most once per
/// request.
///
/// # Example
///
/// ```rust
/// use tower_oauth_guard::{ScopeSet, TokenOutcome, ValidateToken, ValidatorFault};
///
/// #[derive(Clone)]
/// struct PrefixValidator;
///
/// impl ValidateToken for PrefixValidator {
///     async fn validate(&self, token: &str) -> Result<TokenOutcome, ValidatorFault> {
///         if let Some(user) = token.strip_prefix("user-") {
///             Ok(TokenOutcome::Valid {
///                 resource: user.to_string(),
///                 scope: ScopeSet::from_delimited("read"),
///             })
///         } else {
///             Ok(TokenOutcome::Invalid {
///                 reason: "unrecognized token".to_string(),
///             })
///         }
///     }
/// }
/// ```
pub trait ValidateToken: Clone + Send + Sync + 'static {
    /// Validate a bearer token.
    ///
    /// Returns `Ok(TokenOutcome)` whether or not the token was accepted;
    /// `Err(ValidatorFault)` only when the validator itself failed.
    fn validate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<TokenOutcome, ValidatorFault>> + Send;
}

/// A grant held by the in-memory validator: who the token belongs to and
/// what it may do.
#[derive(Debug, Clone)]
struct Grant {
    resource: String,
    scope: ScopeSet,
}

/// In-memory token validator backed by a static token table.
///
/// Suitable for tests and for hosts whose token set is fixed at startup. For
/// anything else, implement [`ValidateToken`] against your real token store.
///
/// # Example
///
/// ```rust
/// use tower_oauth_guard::StaticTokenValidator;
///
/// let validator = StaticTokenValidator::new()
///     .token("tok-alice", "alice", ["read", "write"])
///     .token("tok-bob", "bob", ["read"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticTokenValidator {
    grants: Arc<HashMap<String, Grant>>,
}

impl StaticTokenValidator {
    /// Create a validator with no known tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token resolving to the given resource with the given scopes.
    pub fn token(
        mut self,
        token: impl Into<String>,
        resource: impl Into<String>,
        scopes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Arc::make_mut(&mut self.grants).insert(
            token.into(),
            Grant {
                resource: resource.into(),
                scope: scopes.into_iter().collect(),
            },
        );
        self
    }
}

impl ValidateToken for StaticTokenValidator {
    async fn validate(&self, token: &str) -> Result<TokenOutcome, ValidatorFault> {
        match self.grants.get(token) {
            Some(grant) => Ok(TokenOutcome::Valid {
                resource: grant.resource.clone(),
                scope: grant.scope.clone(),
            }),
            None => Ok(TokenOutcome::Invalid {
                reason: "token not found".to_string(),
            }),
        }
    }
}
