use crate::aws::{Account, Role};
use crate::http::api_client::ApiClient;
use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use select::document::Document;
use select::node::Node;
use select::predicate::{Class, Name};
use std::collections::HashMap;
use std::time::Duration;

const AWS_SAML_ENDPOINT: &str = "https://signin.aws.amazon.com/saml";
const ACCOUNT_NAME_PREFIX: &str = "Account: ";

/// This struct posts the SAML assertion to the AWS sign-in broker and
/// scrapes its account picker page into a role catalog. Principals are not
/// known at this point; they get merged in from the assertion afterwards.
pub struct FederationPortalClient {
    api_client: Box<dyn FederationPortalApi>,
}

#[async_trait]
pub trait FederationPortalApi: Send + Sync {
    async fn account_picker_page(&self, assertion: &str) -> Result<String>;
}

pub struct FederationPortal {
    endpoint: String,
    client: ApiClient,
}

impl FederationPortal {
    pub fn new(endpoint: String, timeout: Duration) -> Result<FederationPortal> {
        Ok(FederationPortal {
            endpoint,
            client: ApiClient::new(timeout)?,
        })
    }
}

#[async_trait]
impl FederationPortalApi for FederationPortal {
    async fn account_picker_page(&self, assertion: &str) -> Result<String> {
        let mut form = HashMap::new();
        form.insert(String::from("SAMLResponse"), assertion.to_string());

        let response = self.client.post_form(self.endpoint.as_str(), &form).await?;
        Ok(response.text().await?)
    }
}

impl FederationPortalClient {
    pub fn new(timeout: Duration) -> Result<FederationPortalClient> {
        let api_client = FederationPortal::new(String::from(AWS_SAML_ENDPOINT), timeout)?;

        Ok(FederationPortalClient {
            api_client: Box::new(api_client),
        })
    }

    pub async fn role_directory(&self, assertion: &str) -> Result<Vec<Account>> {
        let page = self.api_client.account_picker_page(assertion).await?;
        Ok(parse_account_catalog(page.as_str()))
    }
}

/// One account per `div.saml-account` block: the account name (with its
/// `"Account: "` prefix stripped) and one role per `div.saml-role`. A block
/// with broken internals is dropped whole, so a single bad account cannot
/// abort the fetch.
pub fn parse_account_catalog(html: &str) -> Vec<Account> {
    let document = Document::from(html);
    let mut accounts = vec![];

    for account_node in document.find(Class("saml-account")) {
        match parse_account(&account_node) {
            Some(account) => accounts.push(account),
            None => warn!("skipping malformed account block in the AWS sign-in page"),
        }
    }

    accounts
}

fn parse_account(node: &Node) -> Option<Account> {
    let name = node.find(Class("saml-account-name")).next()?.text();
    let name = name
        .trim()
        .strip_prefix(ACCOUNT_NAME_PREFIX)
        .unwrap_or(name.trim())
        .to_string();

    let mut roles = vec![];
    for role_node in node.find(Class("saml-role")) {
        let display_name = role_node.find(Name("label")).next()?.text();
        let arn = role_node.find(Name("input")).next()?.attr("value")?;
        roles.push(Role::new(
            arn.to_string(),
            display_name.trim().to_string(),
        ));
    }

    Some(Account::new(name, roles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    const PICKER_PAGE: &str = r#"<html><body><form>
        <fieldset>
          <div class="saml-account">
            <div class="saml-account-name">Account: production (111111111111)</div>
            <div class="saml-role">
              <input type="radio" name="roleIndex" value="arn:aws:iam::111111111111:role/admin"/>
              <label>admin</label>
            </div>
            <div class="saml-role">
              <input type="radio" name="roleIndex" value="arn:aws:iam::111111111111:role/readonly"/>
              <label>readonly</label>
            </div>
          </div>
          <div class="saml-account">
            <div class="saml-account-name">Account: sandbox (222222222222)</div>
            <div class="saml-role">
              <input type="radio" name="roleIndex" value="arn:aws:iam::222222222222:role/developer"/>
              <label>developer</label>
            </div>
          </div>
        </fieldset>
        </form></body></html>"#;

    #[test]
    fn test_parse_account_catalog() {
        let accounts = parse_account_catalog(PICKER_PAGE);

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name(), "production (111111111111)");
        assert_eq!(accounts[0].roles().len(), 2);
        assert_eq!(
            accounts[0].roles()[0].arn(),
            "arn:aws:iam::111111111111:role/admin"
        );
        assert_eq!(accounts[0].roles()[0].display_name(), "admin");
        assert_eq!(accounts[1].name(), "sandbox (222222222222)");
        assert_eq!(accounts[1].roles().len(), 1);
    }

    #[test]
    fn test_parse_strips_account_prefix_only() {
        let html = r#"<div class="saml-account">
            <div class="saml-account-name">unprefixed</div>
        </div>"#;
        let accounts = parse_account_catalog(html);
        assert_eq!(accounts[0].name(), "unprefixed");
    }

    #[test]
    fn test_malformed_account_block_is_dropped_whole() {
        let html = r#"
        <div class="saml-account">
          <div class="saml-account-name">Account: broken</div>
          <div class="saml-role"><label>no input tag</label></div>
        </div>
        <div class="saml-account">
          <div class="saml-account-name">Account: intact</div>
          <div class="saml-role">
            <input value="arn:aws:iam::333333333333:role/ops"/>
            <label>ops</label>
          </div>
        </div>"#;

        let accounts = parse_account_catalog(html);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name(), "intact");
    }

    #[test]
    fn test_empty_page_yields_empty_catalog() {
        assert!(parse_account_catalog("<html><body/></html>").is_empty());
    }

    #[tokio::test]
    async fn test_role_directory_posts_assertion() {
        let server = MockServer::start();
        let post_mock = server.mock(|when, then| {
            when.method("POST")
                .path("/saml")
                .body_contains("SAMLResponse=the-assertion");
            then.status(200)
                .header("content-type", "text/html")
                .body(PICKER_PAGE);
        });

        let client = FederationPortalClient {
            api_client: Box::new(
                FederationPortal::new(server.url("/saml"), Duration::from_secs(5)).unwrap(),
            ),
        };
        let accounts = client.role_directory("the-assertion").await.unwrap();

        post_mock.assert();
        assert_eq!(accounts.len(), 2);
    }
}
