//! Register command - activate products on an already announced system.

use anyhow::{Context, Result};
use clap::Args;

use super::{ServerArgs, explain, resolve_regcode};
use crate::config::LocalConfig;
use crate::scc::SystemRegistry;
use crate::session::ProductSpec;

#[derive(Args)]
pub struct RegisterCmd {
    /// System login
    #[arg(long)]
    pub login: String,

    /// System password
    #[arg(long, env = "SCC_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Product: identifier/version/arch[:regcode] (repeatable)
    #[arg(long = "product", required = true)]
    pub products: Vec<ProductSpec>,

    /// Registration code for products without their own
    #[arg(long, env = "SCC_REGCODE", hide_env_values = true)]
    pub regcode: Option<String>,

    #[command(flatten)]
    pub server: ServerArgs,
}

impl RegisterCmd {
    pub async fn run(&self) -> Result<()> {
        let config = LocalConfig::load()?;
        let regcode = resolve_regcode(self.regcode.as_deref(), &config)?;
        let client = self.server.client(&config)?;

        for product in &self.products {
            let request = product.to_request(&regcode);
            let service = client
                .register_product(&self.login, &self.password, &request)
                .await
                .map_err(explain)
                .with_context(|| format!("Failed to register {product}"))?;

            println!("Registered product: {product} -> {} {}", service.name, service.url);
        }

        Ok(())
    }
}
