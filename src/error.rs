use thiserror::Error;

/// The identity provider page carried no `SAMLResponse` form input. Not a
/// hard failure by itself: the sign-on flow treats it as "this is a login
/// page" and decides whether a fallback is still available.
#[derive(Debug, Error)]
#[error("no SAMLResponse input found in the identity provider response")]
pub struct AssertionNotFound;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Network or TLS failure talking to the identity provider. Fatal, no
    /// retry.
    #[error("could not reach the identity provider: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body did not yield a decodable SAML assertion. The
    /// sign-on flow retries once with forms authentication; a second
    /// occurrence is fatal.
    #[error("malformed SAML assertion: {0}")]
    MalformedAssertion(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no roles available (if you supplied a filter, try the unfiltered result)")]
    NoRolesAvailable,
    #[error("invalid selection {input:?}: expected a number between 0 and {max}")]
    InvalidSelection { input: String, max: usize },
}
