//! Per-request credential resolution.
//!
//! [`RequestAuthorizer`] holds the raw bearer token for one request and
//! resolves it through the external validator lazily, at most once, no matter
//! how many times authentication state is queried. The resolved [`Credential`]
//! is immutable and lives only for the request.

use tokio::sync::OnceCell;

use crate::error::ValidatorFault;
use crate::scope::ScopeSet;
use crate::validator::{TokenOutcome, ValidateToken};

/// The authenticated identity and granted scopes derived from one request.
///
/// An unauthenticated credential exposes no resource and an empty scope set;
/// the constructors make any other combination unrepresentable. After the
/// guard admits a request it inserts the credential into the request
/// extensions, so handlers can read `is_authenticated` / `resource` / `scope`
/// without touching the validator again.
#[derive(Debug, Clone)]
pub struct Credential {
    authenticated: bool,
    resource: Option<String>,
    scope: ScopeSet,
}

impl Credential {
    /// Credential for a request that presented a valid token.
    pub fn authenticated(resource: impl Into<String>, scope: ScopeSet) -> Self {
        Self {
            authenticated: true,
            resource: Some(resource.into()),
            scope,
        }
    }

    /// Credential for a request with no valid token.
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            resource: None,
            scope: ScopeSet::new(),
        }
    }

    /// True iff the request carried a credential the validator accepted.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Identifier of the resource owner; present iff authenticated.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Scopes granted to the credential; empty if unauthenticated.
    pub fn scope(&self) -> &ScopeSet {
        &self.scope
    }
}

/// Lazily-resolved, memoized credential for one request.
///
/// Construct one per request with whatever bearer token the request carried
/// (or `None`). The first query triggers validation through the external
/// validator; every later query reads the cached result.
///
/// # Example
///
/// ```rust
/// use tower_oauth_guard::{RequestAuthorizer, StaticTokenValidator};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), tower_oauth_guard::ValidatorFault> {
/// let validator = StaticTokenValidator::new().token("tok", "alice", ["read"]);
/// let authorizer = RequestAuthorizer::new(validator, Some("tok".to_string()));
///
/// assert!(authorizer.authenticated().await?);
/// assert_eq!(authorizer.resource().await?.as_deref(), Some("alice"));
/// assert!(authorizer.scope().await?.contains("read"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RequestAuthorizer<V> {
    validator: V,
    token: Option<String>,
    resolved: OnceCell<Credential>,
}

impl<V: ValidateToken> RequestAuthorizer<V> {
    /// Create an authorizer for one request.
    ///
    /// `token` is the bearer token extracted from the request, if any. An
    /// absent or rejected token resolves to the anonymous credential; that is
    /// the normal unauthenticated outcome, not an error.
    pub fn new(validator: V, token: Option<String>) -> Self {
        Self {
            validator,
            token,
            resolved: OnceCell::new(),
        }
    }

    /// Whether the request carried a token at all, parsable or not.
    ///
    /// Does not trigger validation.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Resolve and cache the credential, consulting the validator at most
    /// once for the lifetime of this authorizer.
    pub async fn credential(&self) -> Result<&Credential, ValidatorFault> {
        self.resolved
            .get_or_try_init(|| async {
                let Some(token) = self.token.as_deref() else {
                    return Ok(Credential::anonymous());
                };
                match self.validator.validate(token).await? {
                    TokenOutcome::Valid { resource, scope } => {
                        Ok(Credential::authenticated(resource, scope))
                    }
                    TokenOutcome::Invalid { reason } => {
                        tracing::debug!(%reason, "bearer token rejected");
                        Ok(Credential::anonymous())
                    }
                }
            })
            .await
    }

    /// True iff the current request carries an accepted credential.
    pub async fn authenticated(&self) -> Result<bool, ValidatorFault> {
        Ok(self.credential().await?.is_authenticated())
    }

    /// Granted scope set; empty if unauthenticated.
    pub async fn scope(&self) -> Result<ScopeSet, ValidatorFault> {
        Ok(self.credential().await?.scope().clone())
    }

    /// Resource owner identifier; present iff authenticated.
    pub async fn resource(&self) -> Result<Option<String>, ValidatorFault> {
        Ok(self.credential().await?.resource().map(String::from))
    }
}
