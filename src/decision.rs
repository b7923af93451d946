//! The authorization decision function.
//!
//! [`decide`] is the reproducible core of the guard: a pure function of a
//! resolved [`Credential`] and a declared [`AuthorizationRequirement`].
//! Authentication is always checked before scope, because a scope is
//! meaningless without an identity.

use crate::authorizer::Credential;
use crate::scope::AuthorizationRequirement;

/// Tri-state outcome of evaluating a credential against a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed; the guard writes no response.
    Allow,
    /// No accepted credential; the guard answers 401.
    DenyUnauthenticated,
    /// Valid credential, missing the required scope; the guard answers 403.
    DenyInsufficientScope {
        /// The scope the requirement named and the credential lacks.
        missing: String,
    },
}

/// Decide whether `credential` satisfies `requirement`.
///
/// The check order is fixed:
///
/// 1. an unauthenticated credential is denied outright, whatever its scope
///    set claims to contain;
/// 2. a declared scope the credential does not hold is denied as
///    insufficient;
/// 3. everything else is allowed -- in particular, an absent requirement
///    admits any authenticated credential, even one with no scopes at all.
pub fn decide(credential: &Credential, requirement: &AuthorizationRequirement) -> Decision {
    if !credential.is_authenticated() {
        return Decision::DenyUnauthenticated;
    }
    if let Some(scope) = requirement.required_scope() {
        if !credential.scope().contains(scope) {
            return Decision::DenyInsufficientScope {
                missing: scope.to_string(),
            };
        }
    }
    Decision::Allow
}
