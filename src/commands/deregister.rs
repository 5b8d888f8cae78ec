//! Deregister command - remove a system by its credentials.

use anyhow::Result;
use clap::Args;

use super::{ServerArgs, explain};
use crate::config::LocalConfig;
use crate::scc::SystemRegistry;

#[derive(Args)]
pub struct DeregisterCmd {
    /// System login
    #[arg(long)]
    pub login: String,

    /// System password
    #[arg(long, env = "SCC_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[command(flatten)]
    pub server: ServerArgs,
}

impl DeregisterCmd {
    pub async fn run(&self) -> Result<()> {
        let config = LocalConfig::load()?;
        let client = self.server.client(&config)?;

        client
            .deregister(&self.login, &self.password)
            .await
            .map_err(explain)?;

        println!("Deregistered system");
        Ok(())
    }
}
