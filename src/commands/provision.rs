//! Provision command - configure zypper on a remote host over ssh.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::{StateArgs, active_record};
use crate::config::LocalConfig;
use crate::provision::{self, SshRunner};

#[derive(Args)]
pub struct ProvisionCmd {
    /// Target host: [user@]host
    #[arg(long)]
    pub host: String,

    /// SSH identity file
    #[arg(long, short = 'i')]
    pub identity: Option<PathBuf>,

    /// SSH port
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Seconds to wait for the ssh connection
    #[arg(long, default_value_t = 30)]
    pub connect_timeout: u32,

    /// Run the script with sudo (for non-root logins)
    #[arg(long)]
    pub sudo: bool,

    #[command(flatten)]
    pub state: StateArgs,
}

impl ProvisionCmd {
    pub async fn run(&self) -> Result<()> {
        let config = LocalConfig::load()?;
        let record = active_record(&self.state.store()?)?;

        let lines = provision::build_script(
            &record.credentials.login,
            &record.credentials.password,
            &record.services(),
        )?;

        let runner = SshRunner::new(&self.host)
            .identity(self.identity.clone())
            .port(self.port)
            .connect_timeout(self.connect_timeout)
            .sudo(self.sudo);

        println!(
            "Configuring {} service(s) on {}...",
            record.products.len(),
            self.host
        );

        provision::run_script(&runner, &lines, &config.retry)
            .await
            .with_context(|| format!("Failed to configure {}", self.host))?;

        println!("Configured {}", self.host);
        Ok(())
    }
}
