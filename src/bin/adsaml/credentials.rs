use crate::utils;
use adsaml::adfs::adfs_client::AdfsClient;
use adsaml::adfs::AdCredentials;
use adsaml::aws::credentials_file::CredentialsFile;
use adsaml::aws::federation::FederationPortalClient;
use adsaml::aws::{role_resolver, sts};
use adsaml::settings::{AdfsHost, AppConfig};
use anyhow::{anyhow, Result};
use clap::Parser;
use std::env;
use std::time::Duration;

const DEFAULT_PROFILE: &str = "default";
const DEFAULT_REGION: &str = "eu-west-1";
const DEFAULT_OUTPUT: &str = "json";
const DEFAULT_TOKEN_DURATION: i32 = 3600;
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

#[derive(Parser)]
pub struct Credentials {
    #[clap(subcommand)]
    sub_command: CredentialsSubCommands,
}

#[derive(Parser)]
enum CredentialsSubCommands {
    Aws(AwsCredentials),
}

#[derive(Parser)]
struct AwsCredentials {
    #[clap(long)]
    idp_url: Option<String>,
    /// Username without any domain qualification
    #[clap(short, long)]
    username: Option<String>,
    #[clap(short, long)]
    domain: Option<String>,
    #[clap(long)]
    upn_suffix: Option<String>,
    /// Profile name the credentials are stored under
    #[clap(short, long)]
    profile: Option<String>,
    /// Substring a role ARN must contain; a unique match skips the menu
    #[clap(short, long)]
    filter: Option<String>,
    /// Token lifetime in seconds (AWS default is 3600; longer is more
    /// convenient but bounded by the role's maximum)
    #[clap(long)]
    token_duration: Option<i32>,
    /// Confirm or override domain, username and profile interactively
    #[clap(short, long)]
    ask: bool,
    #[clap(long)]
    region: Option<String>,
    #[clap(long)]
    output: Option<String>,
    #[clap(long)]
    http_timeout_seconds: Option<u64>,
}

impl Credentials {
    pub async fn run(&self, settings: AppConfig) -> Result<()> {
        match &self.sub_command {
            CredentialsSubCommands::Aws(val) => val.run(settings).await,
        }
    }
}

impl AwsCredentials {
    async fn run(&self, settings: AppConfig) -> Result<()> {
        let mut run = self.find_settings(&settings)?;
        if self.ask {
            run.ask_user()?;
        }

        let upn = format!("{}@{}.{}", run.username, run.domain, run.upn_suffix);
        println!();
        println!("Will use the username {upn}");
        let password = utils::prompt_password()?;
        let credentials = AdCredentials::new(run.domain.clone(), upn, password);

        let timeout = Duration::from_secs(run.http_timeout_seconds);
        let client = AdfsClient::new(timeout)?;
        let assertion = client.saml_assertion(run.idp_url.as_str(), &credentials).await?;
        // the secret's scope ends with the auth phase
        drop(credentials);

        let authorizations = assertion.role_authorizations()?;
        let portal = FederationPortalClient::new(timeout)?;
        let catalog = portal.role_directory(assertion.raw()).await?;

        let catalog = role_resolver::merge_principals(catalog, &authorizations);
        let catalog = role_resolver::filter_catalog(catalog, run.filter.as_str());
        let role = role_resolver::resolve(catalog, utils::prompt_role_selection)?;

        let principal_arn = role
            .principal_arn()
            .ok_or_else(|| anyhow!("selected role {} has no principal", role.arn()))?;
        let credential = sts::assume_role_with_saml(
            role.arn(),
            principal_arn,
            assertion.raw().to_string(),
            run.token_duration,
            run.region.clone(),
        )
        .await?;

        let store = CredentialsFile::new(CredentialsFile::default_path()?);
        store.write_profile(
            run.profile.as_str(),
            &credential,
            run.region.as_str(),
            run.output.as_str(),
        )?;

        utils::print_success_report(&store, run.profile.as_str(), &credential);

        Ok(())
    }

    fn find_settings(&self, settings: &AppConfig) -> Result<RunSettings> {
        let default_settings: Option<AdfsHost> = match self.idp_url.clone() {
            Some(idp_url) => settings.find_host(idp_url.as_str()),
            None => settings.default_host(),
        };

        let idp_url = match self.idp_url.clone() {
            Some(idp_url) => idp_url,
            None => default_settings
                .as_ref()
                .map(|host| host.idp_url())
                .ok_or_else(|| anyhow!("please supply an idp-url"))?,
        };

        let domain = self
            .domain
            .clone()
            .or_else(|| default_settings.as_ref().map(|host| host.domain()))
            .or_else(|| env::var("USERDOMAIN").ok())
            .ok_or_else(|| anyhow!("please supply a domain"))?;

        let upn_suffix = self
            .upn_suffix
            .clone()
            .or_else(|| default_settings.as_ref().map(|host| host.upn_suffix()))
            .ok_or_else(|| anyhow!("please supply a upn-suffix"))?;

        let username = self
            .username
            .clone()
            .or_else(|| default_settings.as_ref().map(|host| host.username()))
            .or_else(|| env::var("USER").or_else(|_| env::var("USERNAME")).ok())
            .ok_or_else(|| anyhow!("please supply a username"))?;

        let profile = self
            .profile
            .clone()
            .or_else(|| default_settings.as_ref().and_then(|host| host.profile()))
            .unwrap_or_else(|| String::from(DEFAULT_PROFILE));

        let region = self
            .region
            .clone()
            .or_else(|| default_settings.as_ref().and_then(|host| host.region()))
            .unwrap_or_else(|| String::from(DEFAULT_REGION));

        let output = self
            .output
            .clone()
            .or_else(|| default_settings.as_ref().and_then(|host| host.output()))
            .unwrap_or_else(|| String::from(DEFAULT_OUTPUT));

        Ok(RunSettings {
            idp_url,
            domain,
            upn_suffix,
            username,
            profile,
            region,
            output,
            filter: self.filter.clone().unwrap_or_default(),
            token_duration: self.token_duration.unwrap_or(DEFAULT_TOKEN_DURATION),
            http_timeout_seconds: self
                .http_timeout_seconds
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS),
        })
    }
}

struct RunSettings {
    idp_url: String,
    domain: String,
    upn_suffix: String,
    username: String,
    profile: String,
    region: String,
    output: String,
    filter: String,
    token_duration: i32,
    http_timeout_seconds: u64,
}

impl RunSettings {
    fn ask_user(&mut self) -> Result<()> {
        self.domain = utils::input_with_default("Enter domain", self.domain.as_str())?;
        self.username = utils::input_with_default("Enter username", self.username.as_str())?;
        self.profile = utils::input_with_default("Enter profile", self.profile.as_str())?;

        Ok(())
    }
}
