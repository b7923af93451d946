//! Process-wide server configuration.
//!
//! [`ServerConfig`] carries the scopes catalog and the host-supplied
//! authenticator capability that the mounted OAuth machinery consumes. It is
//! built once at startup with the fluent methods below, then shared by
//! [`Arc`]: configuration must complete before the middleware is mounted and
//! the server accepts traffic. Mutation after mount is unsupported -- share a
//! fresh config and remount instead.

use std::fmt;
use std::sync::Arc;

/// Capability resolving an (identifier, secret) pair to a principal.
///
/// Supplied by the host (e.g., a user-database lookup) and consumed by the
/// external authorization machinery during grant flows. The guard itself
/// never invokes it.
pub type Authenticator = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// Configuration consumed by the OAuth machinery at mount time.
///
/// # Example
///
/// ```rust
/// use tower_oauth_guard::ServerConfig;
///
/// let config = ServerConfig::new()
///     .scope("read")
///     .scope("write")
///     .authenticator(|username, password| {
///         (username == "alice" && password == "open sesame")
///             .then(|| "alice".to_string())
///     })
///     .into_shared();
///
/// assert_eq!(config.scopes(), ["read", "write"]);
/// ```
#[derive(Clone, Default)]
pub struct ServerConfig {
    scopes: Vec<String>,
    authenticator: Option<Authenticator>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("scopes", &self.scopes)
            .field("authenticator", &self.authenticator.as_ref().map(|_| "..."))
            .finish()
    }
}

impl ServerConfig {
    /// Create a configuration with an empty scopes catalog and no
    /// authenticator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scope to the catalog. Order is preserved.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Append several scopes to the catalog.
    pub fn scopes_catalog(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Set the authenticator capability.
    pub fn authenticator<F>(mut self, authenticator: F) -> Self
    where
        F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Freeze the configuration for sharing with the middleware and host.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The ordered scopes catalog.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Whether the catalog knows the given scope.
    pub fn knows_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Resolve an (identifier, secret) pair through the host's authenticator.
    ///
    /// Returns `None` when no authenticator is configured or the pair is
    /// rejected.
    pub fn authenticate(&self, identifier: &str, secret: &str) -> Option<String> {
        self.authenticator
            .as_ref()
            .and_then(|auth| auth(identifier, secret))
    }
}
