use anyhow::Result;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

// ADFS serves different markup to clients it does not recognize as browsers,
// so every request goes out with a realistic User-Agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0";

pub struct ApiClient {
    http_client: Client,
}

impl ApiClient {
    /// Builds a client with a cookie store (the forms sign-on depends on
    /// session cookies surviving between requests), redirect following, and
    /// server certificate validation left on.
    pub fn new(timeout: Duration) -> Result<ApiClient> {
        Ok(ApiClient {
            http_client: Client::builder()
                .cookie_store(true)
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .build()?,
        })
    }

    pub async fn get(
        &self,
        url: &str,
        authorization: Option<&str>,
    ) -> reqwest::Result<Response> {
        let mut request = self
            .http_client
            .get(url)
            .header(ACCEPT, ApiClient::accept_header());

        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }

        request.send().await
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &HashMap<String, String>,
    ) -> reqwest::Result<Response> {
        self.http_client
            .post(url)
            .header(ACCEPT, ApiClient::accept_header())
            .form(form)
            .send()
            .await
    }

    fn accept_header() -> HeaderValue {
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml")
    }
}
