//! Announce command - register a bare system and print its credentials.

use anyhow::Result;
use clap::Args;

use super::{ServerArgs, explain, resolve_regcode};
use crate::config::LocalConfig;
use crate::scc::SystemRegistry;

#[derive(Args)]
pub struct AnnounceCmd {
    /// Registration code (default: configured regcode)
    #[arg(long, env = "SCC_REGCODE", hide_env_values = true)]
    pub regcode: Option<String>,

    #[command(flatten)]
    pub server: ServerArgs,
}

impl AnnounceCmd {
    pub async fn run(&self) -> Result<()> {
        let config = LocalConfig::load()?;
        let regcode = resolve_regcode(self.regcode.as_deref(), &config)?;
        let client = self.server.client(&config)?;

        let credentials = client.announce(&regcode).await.map_err(explain)?;

        println!("Registered system: {}", credentials.id);
        println!("login:    {}", credentials.login);
        println!("password: {}", credentials.password);

        Ok(())
    }
}
