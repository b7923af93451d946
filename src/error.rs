//! Guard error taxonomy and `WWW-Authenticate` header construction.
//!
//! Errors map to HTTP responses per RFC 6750 Section 3: authentication
//! failures are 401, authorization (scope) failures are 403, and a fault in
//! the external token validator is 500.

/// Boxed error type used at tower service boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transport-level failure while consulting the external token validator.
///
/// This is distinct from a token being rejected: a rejected token is the
/// normal unauthenticated outcome, while a fault means the validator itself
/// could not answer (e.g., its backing store was unreachable). Faults are
/// logged and surface as a generic 500; the message never reaches the wire.
#[derive(Debug, Clone, thiserror::Error)]
#[error("token validator unavailable: {message}")]
pub struct ValidatorFault {
    /// Diagnostic message, for logs only.
    pub message: String,
}

impl ValidatorFault {
    /// Create a fault with the given diagnostic message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Denial raised by the guard for one request.
///
/// Each variant maps to a specific HTTP status code and, where applicable, a
/// `WWW-Authenticate` header value per RFC 6750 Section 3.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GuardError {
    /// The request carried no bearer token.
    /// Returns HTTP 401 with `WWW-Authenticate: Bearer`.
    #[error("missing bearer token")]
    MissingToken,

    /// The request carried a token the validator did not accept.
    /// Returns HTTP 401 with `error="invalid_token"`.
    #[error("invalid token: {reason}")]
    InvalidToken {
        /// Generic description; validator internals are logged, not echoed.
        reason: String,
    },

    /// The credential is valid but lacks the scope the action requires.
    /// Returns HTTP 403 with `error="insufficient_scope"`.
    #[error("insufficient scope: missing {missing}")]
    InsufficientScope {
        /// The scope the action requires and the credential does not have.
        missing: String,
    },

    /// The external token validator failed. Returns HTTP 500.
    #[error(transparent)]
    ValidatorFault(#[from] ValidatorFault),
}

impl GuardError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GuardError::MissingToken | GuardError::InvalidToken { .. } => 401,
            GuardError::InsufficientScope { .. } => 403,
            GuardError::ValidatorFault(_) => 500,
        }
    }

    /// OAuth error code for the JSON body, per RFC 6749 Section 5.2 naming.
    pub fn error_code(&self) -> &'static str {
        match self {
            GuardError::MissingToken | GuardError::InvalidToken { .. } => "invalid_token",
            GuardError::InsufficientScope { .. } => "insufficient_scope",
            GuardError::ValidatorFault(_) => "server_error",
        }
    }

    /// Builds the `WWW-Authenticate` header value per RFC 6750 Section 3.
    ///
    /// Returns `None` for validator faults, which are not challenge
    /// responses. When the request lacked any credential at all, the header
    /// carries no error code (RFC 6750 Section 3 says it SHOULD NOT).
    pub fn www_authenticate(&self) -> Option<String> {
        match self {
            GuardError::MissingToken => Some("Bearer".to_string()),
            GuardError::InvalidToken { reason } => Some(format!(
                "Bearer error=\"invalid_token\", error_description=\"{}\"",
                reason
            )),
            GuardError::InsufficientScope { missing } => Some(format!(
                "Bearer error=\"insufficient_scope\", scope=\"{}\"",
                missing
            )),
            GuardError::ValidatorFault(_) => None,
        }
    }
}
