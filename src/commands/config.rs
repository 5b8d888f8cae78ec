//! Config command - manage local configuration.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::LocalConfig;
use crate::session::ProductSpec;

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub command: ConfigSubCmd,
}

#[derive(Subcommand)]
pub enum ConfigSubCmd {
    /// Set the default system regcode
    SetRegcode(SetRegcodeCmd),

    /// Set the registration server (default: https://scc.suse.com/connect)
    SetServer(SetServerCmd),

    /// Set the request timeout in seconds (0 disables it)
    SetTimeout(SetTimeoutCmd),

    /// Add a product to activate on `sccreg up`
    AddProduct(AddProductCmd),

    /// Remove all configured products
    ClearProducts,

    /// Show current configuration
    Show,
}

#[derive(Args)]
pub struct SetRegcodeCmd {
    /// Registration code
    pub regcode: String,
}

#[derive(Args)]
pub struct SetServerCmd {
    /// Server URL (e.g., https://rmt.example.com/connect)
    pub url: String,
}

#[derive(Args)]
pub struct SetTimeoutCmd {
    pub seconds: u64,
}

#[derive(Args)]
pub struct AddProductCmd {
    /// Product: identifier/version/arch[:regcode]
    pub product: ProductSpec,
}

impl ConfigCmd {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            ConfigSubCmd::SetRegcode(cmd) => {
                let mut config = LocalConfig::load()?;
                config.set_regcode(cmd.regcode.clone());
                config.save()?;
                println!("Regcode saved.");
            }
            ConfigSubCmd::SetServer(cmd) => {
                url::Url::parse(&cmd.url)
                    .map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", cmd.url, e))?;
                let mut config = LocalConfig::load()?;
                config.regserver = cmd.url.trim_end_matches('/').to_string();
                config.save()?;
                println!("Registration server set to: {}", config.regserver);
            }
            ConfigSubCmd::SetTimeout(cmd) => {
                let mut config = LocalConfig::load()?;
                config.timeout_secs = (cmd.seconds > 0).then_some(cmd.seconds);
                config.save()?;
                match config.timeout_secs {
                    Some(secs) => println!("Request timeout set to {secs}s"),
                    None => println!("Request timeout disabled"),
                }
            }
            ConfigSubCmd::AddProduct(cmd) => {
                let mut config = LocalConfig::load()?;
                config.products.push(cmd.product.clone());
                config.save()?;
                println!("Added product: {}", cmd.product);
            }
            ConfigSubCmd::ClearProducts => {
                let mut config = LocalConfig::load()?;
                config.products.clear();
                config.save()?;
                println!("Products cleared.");
            }
            ConfigSubCmd::Show => {
                let config = LocalConfig::load()?;
                println!("Config: {}", LocalConfig::config_path()?.display());
                println!();
                println!(
                    "regcode:   {}",
                    if config.has_regcode() {
                        "(set)"
                    } else {
                        "(not set)"
                    }
                );
                println!("regserver: {}", config.regserver);
                match config.timeout_secs {
                    Some(secs) => println!("timeout:   {secs}s"),
                    None => println!("timeout:   (none)"),
                }
                println!(
                    "retry:     {} attempts, {}ms..{}ms backoff",
                    config.retry.max_attempts,
                    config.retry.initial_delay_ms,
                    config.retry.max_delay_ms
                );
                println!("products:");
                if config.products.is_empty() {
                    println!("  (none)");
                }
                for product in &config.products {
                    let own_regcode = if product.regcode.is_some() {
                        " (own regcode)"
                    } else {
                        ""
                    };
                    println!("  {product}{own_regcode}");
                }
            }
        }
        Ok(())
    }
}
