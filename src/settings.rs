use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use url::Url;

#[derive(Serialize, Deserialize, Default)]
pub struct AppConfig {
    hosts: Option<Vec<AdfsHost>>,
}

/// Stored defaults for one ADFS entry URL: the sign-on endpoint, the AD
/// domain and UPN suffix the username is qualified with, and optional
/// credential-file settings.
#[derive(Serialize, Deserialize, Clone)]
pub struct AdfsHost {
    idp_url: String,
    domain: String,
    upn_suffix: String,
    username: String,
    profile: Option<String>,
    region: Option<String>,
    output: Option<String>,
}

impl AppConfig {
    pub fn add_host(&mut self, host: AdfsHost) {
        let hosts = self.hosts.get_or_insert(vec![]);
        match hosts.iter_mut().find(|i| i.idp_url == host.idp_url) {
            Some(existing) => {
                *existing = host;
            }
            None => {
                hosts.push(host);
            }
        }
    }

    pub fn default_host(&self) -> Option<AdfsHost> {
        self.hosts.as_ref()?.first().cloned()
    }

    pub fn find_host(&self, idp_url: &str) -> Option<AdfsHost> {
        match &self.hosts {
            Some(hosts) => hosts.iter().find(|host| idp_url == host.idp_url).cloned(),
            None => None,
        }
    }

    pub fn read_config() -> Result<Self> {
        let config_file = AppConfig::config_file()?;
        if !config_file.exists() {
            return Ok(AppConfig::default());
        }

        let config_contents = fs::read_to_string(config_file)?;
        let config: AppConfig = toml::from_str(config_contents.as_str())?;

        Ok(config)
    }

    pub fn write_config(&self) -> Result<()> {
        let config_dir = AppConfig::config_dir()?;
        fs::create_dir_all(config_dir)?;

        let config_file = AppConfig::config_file()?;
        let toml = toml::to_string(&self)?;
        fs::write(config_file, toml)?;

        Ok(())
    }

    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("could not determine config directory"))?
            .join("adsaml");

        Ok(config_dir)
    }

    fn config_file() -> Result<PathBuf> {
        let config_file = AppConfig::config_dir()?.join("settings.toml");

        Ok(config_file)
    }
}

impl AdfsHost {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        idp_url: String,
        domain: String,
        upn_suffix: String,
        username: String,
        profile: Option<String>,
        region: Option<String>,
        output: Option<String>,
    ) -> Result<Self> {
        // the entry URL keeps its query string: loginToRp is part of it
        let idp_url = Url::parse(idp_url.as_str())?;

        Ok(AdfsHost {
            idp_url: String::from(idp_url),
            domain,
            upn_suffix,
            username,
            profile,
            region,
            output,
        })
    }

    pub fn idp_url(&self) -> String {
        self.idp_url.clone()
    }

    pub fn domain(&self) -> String {
        self.domain.clone()
    }

    pub fn upn_suffix(&self) -> String {
        self.upn_suffix.clone()
    }

    pub fn username(&self) -> String {
        self.username.clone()
    }

    pub fn profile(&self) -> Option<String> {
        self.profile.clone()
    }

    pub fn region(&self) -> Option<String> {
        self.region.clone()
    }

    pub fn output(&self) -> Option<String> {
        self.output.clone()
    }
}
