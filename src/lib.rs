//! # tower-oauth-guard
//!
//! Tower middleware that guards HTTP actions with OAuth2 resource-server
//! checks.
//!
//! The crate sits between a web application and the machinery that owns
//! OAuth2 tokens. For each covered request it answers one question -- may
//! this action run? -- and emits the matching side effect: pass-through on
//! allow, a terminating 401/403 on deny. Token issuance, persistence, and
//! cryptographic verification stay behind the [`ValidateToken`] trait.
//!
//! ## Pieces
//!
//! - [`ScopeSet`] / [`AuthorizationRequirement`]: granted scopes and the
//!   at-most-one scope an action declares.
//! - [`RequestAuthorizer`] / [`Credential`]: per-request credential
//!   resolution, memoized so the validator is consulted at most once per
//!   request.
//! - [`decide`] / [`Decision`]: the pure decision function --
//!   authentication first, then scope.
//! - [`GuardLayer`] / [`GuardService`]: the tower middleware that wires the
//!   above into the request lifecycle, with an [`ActionSelector`] choosing
//!   which paths it covers.
//! - [`ServerConfig`]: the scopes catalog and host authenticator capability,
//!   built before mount and shared by `Arc`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{routing::get, Router};
//! use tower_oauth_guard::{
//!     ActionSelector, Credential, GuardLayer, ServerConfig, StaticTokenValidator,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::new().scope("read").scope("write").into_shared();
//!
//!     let validator = StaticTokenValidator::new()
//!         .token("tok-alice", "alice", ["read", "write"]);
//!
//!     // Reads need authentication; writes additionally need the
//!     // "write" scope.
//!     let app = Router::new()
//!         .route("/notes", get(list_notes).post(create_note))
//!         .layer(
//!             GuardLayer::new(validator.clone())
//!                 .require_scope("write")
//!                 .selector(ActionSelector::only(["/notes/edit"]))
//!                 .config(Arc::clone(&config)),
//!         )
//!         .layer(GuardLayer::new(validator).config(config));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//!
//! // Handlers read the resolved credential from request extensions.
//! async fn list_notes(
//!     axum::Extension(credential): axum::Extension<Credential>,
//! ) -> String {
//!     format!("notes for {}", credential.resource().unwrap_or("?"))
//! }
//! # async fn create_note() {}
//! ```
//!
//! ## Decision protocol
//!
//! 1. No accepted credential → 401 with `WWW-Authenticate: Bearer` (plus
//!    `error="invalid_token"` when a token was presented and rejected).
//! 2. Accepted credential, required scope not granted → 403 with
//!    `error="insufficient_scope", scope="<missing>"`.
//! 3. Otherwise → the action runs and the guard writes nothing.
//!
//! A fault in the validator itself (not a rejected token) is the one case
//! that escalates: it is logged and answered with a generic 500, never
//! downgraded to a 401.
//!
//! ## Ordering contract
//!
//! [`ServerConfig`] and every [`GuardLayer`] must be fully built before the
//! middleware is mounted and the server starts accepting requests.
//! Configuration is read-only from then on; requests already in flight see
//! the config they were dispatched with.

pub mod authorizer;
pub mod config;
pub mod decision;
pub mod error;
pub mod guard;
pub mod scope;
pub mod validator;

// Re-exports
pub use authorizer::{Credential, RequestAuthorizer};
pub use config::{Authenticator, ServerConfig};
pub use decision::{decide, Decision};
pub use error::{BoxError, GuardError, ValidatorFault};
pub use guard::{ActionSelector, GuardLayer, GuardService};
pub use scope::{AuthorizationRequirement, ScopeSet};
pub use validator::{StaticTokenValidator, TokenOutcome, ValidateToken};
