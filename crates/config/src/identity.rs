//! Runtime caller identity.
//!
//! Produced by the identity layer from a validated bearer credential and
//! attached to the request. It lives exactly as long as the request does.

/// The authenticated caller of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// The subject (`sub` claim) of the validated credential.
    pub subject: String,
}
