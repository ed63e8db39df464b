use secrecy::{ExposeSecret, SecretString};

pub mod adfs_client;
mod ntlm;
pub mod saml_parsers;

/// Active Directory credentials for one sign-on. The password lives in a
/// [`SecretString`] so it is zeroised on drop; the cleartext is only exposed
/// inside this module, for the NTLM and forms legs. Scrubbing is best-effort:
/// the HTTP stack still copies the bytes into its request buffers.
pub struct AdCredentials {
    domain: String,
    username: String,
    password: SecretString,
}

impl AdCredentials {
    /// `username` is the full user principal name, `user@domain.suffix`.
    pub fn new(domain: String, username: String, password: SecretString) -> AdCredentials {
        AdCredentials {
            domain,
            username,
            password,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}
