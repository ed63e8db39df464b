use crate::adfs::saml_parsers::SamlAssertion;
use crate::adfs::{ntlm, saml_parsers, AdCredentials};
use crate::error::AuthError;
use crate::http::api_client::ApiClient;
use anyhow::Result;
use log::warn;
use std::collections::HashMap;
use std::time::Duration;

/// Drives the sign-on exchange with the ADFS entry URL: Windows-integrated
/// (NTLM) authentication first, forms authentication as the one-shot
/// fallback. The two mechanisms run in strict sequence because the fallback
/// only makes sense after the primary failed to produce an assertion.
pub struct AdfsClient {
    client: ApiClient,
}

impl AdfsClient {
    pub fn new(timeout: Duration) -> Result<AdfsClient> {
        Ok(AdfsClient {
            client: ApiClient::new(timeout)?,
        })
    }

    /// Runs the NTLM-authenticated GET and extracts the assertion from the
    /// final response body. If that body does not contain a decodable
    /// assertion, retries exactly once through the forms sign-on; a second
    /// failure is fatal.
    pub async fn saml_assertion(
        &self,
        entry_url: &str,
        credentials: &AdCredentials,
    ) -> Result<SamlAssertion, AuthError> {
        let body = ntlm::negotiate_get(&self.client, entry_url, credentials)
            .await?
            .text()
            .await?;

        match AdfsClient::assertion_from_page(body.as_str()) {
            Ok(assertion) => Ok(assertion),
            Err(primary_error) => {
                warn!(
                    "NTLM negotiation did not produce an assertion ({primary_error}); \
                     retrying with forms authentication"
                );
                let body = self.forms_sign_on(entry_url, credentials).await?;
                AdfsClient::assertion_from_page(body.as_str())
            }
        }
    }

    /// The fallback leg: a plain GET to pick up session cookies (no NTLM
    /// state carries over), then the POST the ADFS forms sign-on page
    /// expects.
    async fn forms_sign_on(
        &self,
        entry_url: &str,
        credentials: &AdCredentials,
    ) -> Result<String, AuthError> {
        self.client.get(entry_url, None).await?;

        let mut form = HashMap::new();
        form.insert(
            String::from("UserName"),
            credentials.username().to_string(),
        );
        form.insert(
            String::from("Password"),
            credentials.password().to_string(),
        );
        form.insert(
            String::from("optionForms"),
            String::from("FormsAuthentication"),
        );

        let response = self.client.post_form(entry_url, &form).await?;
        Ok(response.text().await?)
    }

    fn assertion_from_page(html: &str) -> Result<SamlAssertion, AuthError> {
        let raw = saml_parsers::extract_assertion(html)
            .map_err(|e| AuthError::MalformedAssertion(e.to_string()))?;
        SamlAssertion::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use httpmock::MockServer;
    use secrecy::SecretString;

    const LOGIN_FORM_PAGE: &str = r#"<html><body>
        <form id="loginForm" method="post">
          <input name="UserName" type="email"/>
          <input name="Password" type="password"/>
        </form></body></html>"#;

    fn credentials() -> AdCredentials {
        AdCredentials::new(
            String::from("CORP"),
            String::from("user@corp.example.com"),
            SecretString::from(String::from("hunter2")),
        )
    }

    fn assertion_page() -> String {
        let xml = r#"<?xml version="1.0"?>
            <samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
                            xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion">
              <saml2:Assertion><saml2:AttributeStatement/></saml2:Assertion>
            </samlp:Response>"#;
        format!(
            r#"<html><body><form><input name="SAMLResponse" value="{}"/></form></body></html>"#,
            BASE64.encode(xml)
        )
    }

    #[tokio::test]
    async fn test_assertion_from_primary_response() {
        let server = MockServer::start();
        let get_mock = server.mock(|when, then| {
            when.method("GET").path("/adfs/ls");
            then.status(200)
                .header("content-type", "text/html")
                .body(assertion_page());
        });

        let client = AdfsClient::new(Duration::from_secs(5)).unwrap();
        let assertion = client
            .saml_assertion(server.url("/adfs/ls").as_str(), &credentials())
            .await
            .unwrap();

        get_mock.assert();
        assert!(!assertion.raw().is_empty());
    }

    #[tokio::test]
    async fn test_forms_fallback_attempted_exactly_once() {
        let server = MockServer::start();
        let get_mock = server.mock(|when, then| {
            when.method("GET").path("/adfs/ls");
            then.status(200)
                .header("content-type", "text/html")
                .body(LOGIN_FORM_PAGE);
        });
        let post_mock = server.mock(|when, then| {
            when.method("POST")
                .path("/adfs/ls")
                .body_contains("optionForms=FormsAuthentication")
                .body_contains("UserName=user%40corp.example.com");
            then.status(200)
                .header("content-type", "text/html")
                .body(assertion_page());
        });

        let client = AdfsClient::new(Duration::from_secs(5)).unwrap();
        let assertion = client
            .saml_assertion(server.url("/adfs/ls").as_str(), &credentials())
            .await
            .unwrap();

        // primary GET plus the cookie-establishing GET of the fallback
        get_mock.assert_hits(2);
        post_mock.assert_hits(1);
        assert!(!assertion.raw().is_empty());
    }

    #[tokio::test]
    async fn test_second_failure_is_fatal_with_no_third_attempt() {
        let server = MockServer::start();
        let get_mock = server.mock(|when, then| {
            when.method("GET").path("/adfs/ls");
            then.status(200)
                .header("content-type", "text/html")
                .body(LOGIN_FORM_PAGE);
        });
        let post_mock = server.mock(|when, then| {
            when.method("POST").path("/adfs/ls");
            then.status(200)
                .header("content-type", "text/html")
                .body(LOGIN_FORM_PAGE);
        });

        let client = AdfsClient::new(Duration::from_secs(5)).unwrap();
        let result = client
            .saml_assertion(server.url("/adfs/ls").as_str(), &credentials())
            .await;

        assert!(matches!(result, Err(AuthError::MalformedAssertion(_))));
        get_mock.assert_hits(2);
        post_mock.assert_hits(1);
    }
}
