use adsaml::settings::{AdfsHost, AppConfig};
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
pub struct Config {
    #[clap(subcommand)]
    sub_command: ConfigSubCommand,
}

#[derive(Parser)]
enum ConfigSubCommand {
    Add(ConfigAdd),
}

#[derive(Parser)]
struct ConfigAdd {
    #[clap(subcommand)]
    sub_command: ConfigAddSubCommand,
}

#[derive(Parser)]
enum ConfigAddSubCommand {
    Adfs(ConfigAddAdfs),
}

#[derive(Parser)]
struct ConfigAddAdfs {
    /// The IdP-initiated sign-on URL, including its loginToRp query
    #[clap(required = true, long)]
    idp_url: String,
    #[clap(required = true, short, long)]
    domain: String,
    /// Completes the sign-on name: user@{domain}.{upn-suffix}
    #[clap(required = true, long)]
    upn_suffix: String,
    #[clap(required = true, short, long)]
    username: String,
    #[clap(short, long)]
    profile: Option<String>,
    #[clap(long)]
    region: Option<String>,
    #[clap(long)]
    output: Option<String>,
}

impl Config {
    pub fn run(&self, settings: &mut AppConfig) -> Result<()> {
        match &self.sub_command {
            ConfigSubCommand::Add(val) => match &val.sub_command {
                ConfigAddSubCommand::Adfs(val) => val.run(settings),
            },
        }
    }
}

impl ConfigAddAdfs {
    fn run(&self, settings: &mut AppConfig) -> Result<()> {
        let host = AdfsHost::new(
            self.idp_url.clone(),
            self.domain.clone(),
            self.upn_suffix.clone(),
            self.username.clone(),
            self.profile.clone(),
            self.region.clone(),
            self.output.clone(),
        )?;
        settings.add_host(host);
        settings.write_config()?;

        Ok(())
    }
}
