//! The action guard: tower middleware enforcing authorization decisions.
//!
//! [`GuardLayer`] is declared once at configuration time with an optional
//! required scope and an [`ActionSelector`] naming which actions it covers.
//! At request time the wrapped [`GuardService`] resolves the request's
//! credential through [`RequestAuthorizer`], asks [`decide`], and either
//! forwards the request untouched or terminates it with the appropriate
//! 401/403 response. The inner service never runs on a denial, and the guard
//! never writes a response on an allow.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::Layer;

use crate::authorizer::RequestAuthorizer;
use crate::config::ServerConfig;
use crate::decision::{decide, Decision};
use crate::error::GuardError;
use crate::scope::AuthorizationRequirement;
use crate::validator::ValidateToken;

/// Selects which request paths a guard covers.
///
/// Matching is by path prefix. The host declares an allow-list (`only`) or a
/// deny-list (`except`); the default covers everything.
#[derive(Debug, Clone, Default)]
pub enum ActionSelector {
    /// Guard every request.
    #[default]
    All,
    /// Guard only requests whose path starts with one of these prefixes.
    Only(Vec<String>),
    /// Guard everything except paths starting with one of these prefixes.
    Except(Vec<String>),
}

impl ActionSelector {
    /// Allow-list selector: guard only the given path prefixes.
    pub fn only(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Only(paths.into_iter().map(Into::into).collect())
    }

    /// Deny-list selector: guard everything but the given path prefixes.
    pub fn except(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Except(paths.into_iter().map(Into::into).collect())
    }

    /// Whether the guard covers this request path.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(prefixes) => prefixes.iter().any(|p| path.starts_with(p.as_str())),
            Self::Except(prefixes) => !prefixes.iter().any(|p| path.starts_with(p.as_str())),
        }
    }
}

/// Tower layer that guards actions with an OAuth2 authorization check.
///
/// # Example
///
/// ```rust,no_run
/// use tower_oauth_guard::{ActionSelector, GuardLayer, StaticTokenValidator};
///
/// let validator = StaticTokenValidator::new().token("tok", "alice", ["read", "write"]);
///
/// // Require authentication everywhere, and the "write" scope on /admin.
/// let authenticated = GuardLayer::new(validator.clone());
/// let admin_only = GuardLayer::new(validator)
///     .require_scope("write")
///     .selector(ActionSelector::only(["/admin"]));
/// ```
#[derive(Clone)]
pub struct GuardLayer<V> {
    validator: V,
    requirement: AuthorizationRequirement,
    selector: ActionSelector,
    config: Option<Arc<ServerConfig>>,
}

impl<V: ValidateToken> GuardLayer<V> {
    /// Create a guard that requires authentication for every request.
    pub fn new(validator: V) -> Self {
        Self {
            validator,
            requirement: AuthorizationRequirement::none(),
            selector: ActionSelector::All,
            config: None,
        }
    }

    /// Additionally require the given scope.
    pub fn require_scope(mut self, scope: impl Into<String>) -> Self {
        self.requirement = AuthorizationRequirement::scope(scope);
        self
    }

    /// Restrict which actions this guard covers.
    pub fn selector(mut self, selector: ActionSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Attach the server configuration.
    ///
    /// The config must be fully built before the guard is mounted. It is
    /// used at mount time to flag required scopes missing from the catalog.
    pub fn config(mut self, config: Arc<ServerConfig>) -> Self {
        self.config = Some(config);
        self
    }
}

impl<S, V: ValidateToken> Layer<S> for GuardLayer<V> {
    type Service = GuardService<S, V>;

    fn layer(&self, inner: S) -> Self::Service {
        if let (Some(config), Some(scope)) = (&self.config, self.requirement.required_scope()) {
            if !config.scopes().is_empty() && !config.knows_scope(scope) {
                tracing::warn!(
                    scope,
                    catalog = ?config.scopes(),
                    "guard requires a scope that is not in the configured catalog"
                );
            }
        }
        GuardService {
            inner,
            validator: self.validator.clone(),
            requirement: self.requirement.clone(),
            selector: self.selector.clone(),
        }
    }
}

/// Tower service created by [`GuardLayer`]. For each covered request:
///
/// 1. Extracts the `Authorization: Bearer <token>` header
/// 2. Resolves the credential once via [`RequestAuthorizer`]
/// 3. Evaluates [`decide`] against the declared requirement
/// 4. On `Allow`, injects the resolved [`Credential`](crate::Credential) into
///    request extensions and calls the inner service
/// 5. On a denial, terminates with 401/403 and a `WWW-Authenticate` header
///
/// A validator fault terminates with a generic 500; the fault is logged and
/// never echoed to the client.
#[derive(Clone)]
pub struct GuardService<S, V> {
    inner: S,
    validator: V,
    requirement: AuthorizationRequirement,
    selector: ActionSelector,
}

impl<S, V> tower_service::Service<Request<Body>> for GuardService<S, V>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<crate::BoxError> + Send,
    V: ValidateToken,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path().to_string();
        let selector = self.selector.clone();
        let requirement = self.requirement.clone();
        let validator = self.validator.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !selector.matches(&path) {
                return inner.call(req).await;
            }

            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string());

            let authorizer = RequestAuthorizer::new(validator, token);

            let credential = match authorizer.credential().await {
                Ok(credential) => credential,
                Err(fault) => {
                    tracing::error!(%path, error = %fault, "token validator fault");
                    return Ok(guard_error_response(&GuardError::from(fault)));
                }
            };

            match decide(credential, &requirement) {
                Decision::Allow => {
                    let mut req = req;
                    req.extensions_mut().insert(credential.clone());
                    inner.call(req).await
                }
                Decision::DenyUnauthenticated => {
                    tracing::debug!(%path, "request denied: unauthenticated");
                    let error = if authorizer.has_token() {
                        GuardError::InvalidToken {
                            reason: "the access token was not accepted".to_string(),
                        }
                    } else {
                        GuardError::MissingToken
                    };
                    Ok(guard_error_response(&error))
                }
                Decision::DenyInsufficientScope { missing } => {
                    tracing::debug!(%path, scope = %missing, "request denied: insufficient scope");
                    Ok(guard_error_response(&GuardError::InsufficientScope {
                        missing,
                    }))
                }
            }
        })
    }
}

/// Build the terminating HTTP response for a denial or fault.
///
/// 401/403 responses carry a `WWW-Authenticate` header per RFC 6750; the
/// body is a small JSON document naming the OAuth error code. Validator
/// faults get a generic 500 body with no detail.
fn guard_error_response(error: &GuardError) -> Response {
    let status = match error.status_code() {
        401 => StatusCode::UNAUTHORIZED,
        403 => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let description = match error {
        GuardError::ValidatorFault(_) => "the authorization service is unavailable".to_string(),
        other => other.to_string(),
    };

    let body = serde_json::json!({
        "error": error.error_code(),
        "error_description": description,
    });

    let mut response = (status, axum::Json(body)).into_response();
    if let Some(www_authenticate) = error.www_authenticate() {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            www_authenticate
                .parse()
                .unwrap_or_else(|_| "Bearer".parse().unwrap()),
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidatorFault;
    use crate::validator::{StaticTokenValidator, TokenOutcome};
    use tower::ServiceExt;
    use tower_service::Service;

    /// A minimal inner service that returns 200 OK for any request
    #[derive(Clone)]
    struct OkService;

    impl tower_service::Service<Request<Body>> for OkService {
        type Response = Response;
        type Error = std::convert::Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<Body>) -> Self::Future {
            Box::pin(async {
                Ok(Response::builder()
                    .status(StatusCode::OK)
                    .body(Body::empty())
                    .unwrap())
            })
        }
    }

    #[derive(Clone)]
    struct FaultyValidator;

    impl ValidateToken for FaultyValidator {
        async fn validate(&self, _token: &str) -> Result<TokenOutcome, ValidatorFault> {
            Err(ValidatorFault::new("store unreachable"))
        }
    }

    fn test_validator() -> StaticTokenValidator {
        StaticTokenValidator::new()
            .token("tok-rw", "alice", ["read", "write"])
            .token("tok-r", "bob", ["read"])
    }

    fn bearer(req: axum::http::request::Builder, token: &str) -> axum::http::request::Builder {
        req.header("Authorization", format!("Bearer {}", token))
    }

    #[test]
    fn test_selector_all() {
        assert!(ActionSelector::All.matches("/anything"));
    }

    #[test]
    fn test_selector_only() {
        let selector = ActionSelector::only(["/admin", "/api"]);
        assert!(selector.matches("/admin/users"));
        assert!(selector.matches("/api"));
        assert!(!selector.matches("/public"));
    }

    #[test]
    fn test_selector_except() {
        let selector = ActionSelector::except(["/health"]);
        assert!(!selector.matches("/health"));
        assert!(!selector.matches("/health/live"));
        assert!(selector.matches("/api"));
    }

    #[tokio::test]
    async fn test_missing_token_returns_401() {
        let mut service = GuardLayer::new(test_validator()).layer(OkService);

        let req = Request::builder().uri("/api").body(Body::empty()).unwrap();
        let resp = service.ready().await.unwrap().call(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get("WWW-Authenticate").unwrap(),
            &"Bearer".parse::<axum::http::HeaderValue>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_rejected_token_returns_401_with_error_code() {
        let mut service = GuardLayer::new(test_validator()).layer(OkService);

        let req = bearer(Request::builder().uri("/api"), "bogus")
            .body(Body::empty())
            .unwrap();
        let resp = service.ready().await.unwrap().call(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let www_auth = resp
            .headers()
            .get("WWW-Authenticate")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.contains("error=\"invalid_token\""));
    }

    #[tokio::test]
    async fn test_insufficient_scope_returns_403() {
        let mut service = GuardLayer::new(test_validator())
            .require_scope("write")
            .layer(OkService);

        let req = bearer(Request::builder().uri("/api"), "tok-r")
            .body(Body::empty())
            .unwrap();
        let resp = service.ready().await.unwrap().call(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let www_auth = resp
            .headers()
            .get("WWW-Authenticate")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.contains("error=\"insufficient_scope\""));
        assert!(www_auth.contains("scope=\"write\""));
    }

    #[tokio::test]
    async fn test_sufficient_scope_passes() {
        let mut service = GuardLayer::new(test_validator())
            .require_scope("write")
            .layer(OkService);

        let req = bearer(Request::builder().uri("/api"), "tok-rw")
            .body(Body::empty())
            .unwrap();
        let resp = service.ready().await.unwrap().call(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!resp.headers().contains_key("WWW-Authenticate"));
    }

    #[tokio::test]
    async fn test_unselected_path_passes_through() {
        let mut service = GuardLayer::new(test_validator())
            .selector(ActionSelector::only(["/admin"]))
            .layer(OkService);

        // No token at all, but the guard does not cover /public.
        let req = Request::builder()
            .uri("/public")
            .body(Body::empty())
            .unwrap();
        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validator_fault_returns_500() {
        let mut service = GuardLayer::new(FaultyValidator).layer(OkService);

        let req = bearer(Request::builder().uri("/api"), "tok")
            .body(Body::empty())
            .unwrap();
        let resp = service.ready().await.unwrap().call(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!resp.headers().contains_key("WWW-Authenticate"));
    }

    #[tokio::test]
    async fn test_allow_injects_credential_extension() {
        use crate::authorizer::Credential;

        #[derive(Clone)]
        struct CheckCredential;

        impl Service<Request<Body>> for CheckCredential {
            type Response = Response;
            type Error = std::convert::Infallible;
            type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

            fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, req: Request<Body>) -> Self::Future {
                let resource = req
                    .extensions()
                    .get::<Credential>()
                    .and_then(|c| c.resource().map(String::from));
                Box::pin(async move {
                    let status = if resource.as_deref() == Some("alice") {
                        StatusCode::OK
                    } else {
                        StatusCode::INTERNAL_SERVER_ERROR
                    };
                    Ok(Response::builder()
                        .status(status)
                        .body(Body::empty())
                        .unwrap())
                })
            }
        }

        let mut service = GuardLayer::new(test_validator()).layer(CheckCredential);

        let req = bearer(Request::builder().uri("/api"), "tok-rw")
            .body(Body::empty())
            .unwrap();
        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
