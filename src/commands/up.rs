//! Up command - announce a system, activate products and record the result.

use anyhow::{Result, bail};
use clap::Args;

use super::{ServerArgs, StateArgs, explain_session, resolve_regcode};
use crate::config::LocalConfig;
use crate::session::{ProductSpec, Session, SessionError};

#[derive(Args)]
pub struct UpCmd {
    /// Registration code (default: configured regcode)
    #[arg(long, env = "SCC_REGCODE", hide_env_values = true)]
    pub regcode: Option<String>,

    /// Product: identifier/version/arch[:regcode] (repeatable, replaces configured products)
    #[arg(long = "product")]
    pub products: Vec<ProductSpec>,

    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub state: StateArgs,
}

impl UpCmd {
    pub async fn run(&self) -> Result<()> {
        let config = LocalConfig::load()?;
        let regcode = resolve_regcode(self.regcode.as_deref(), &config)?;

        let products = if self.products.is_empty() {
            &config.products
        } else {
            &self.products
        };
        if products.is_empty() {
            bail!("No products given. Use --product or `sccreg config add-product`.");
        }

        let regserver = self.server.regserver(&config);
        let session = Session::new(
            self.server.client(&config)?,
            self.state.store()?,
            config.retry,
        );

        let record = match session.create(regserver, &regcode, products).await {
            Ok(record) => record,
            Err(SessionError::Unsaved {
                credentials,
                source,
            }) => {
                // Nothing else knows this system; `sccreg deregister` needs these.
                eprintln!("System {} was registered but not saved.", credentials.id);
                eprintln!("  login:    {}", credentials.login);
                eprintln!("  password: {}", credentials.password);
                eprintln!(
                    "Deregister it with `sccreg deregister --login {} --password <password>`.",
                    credentials.login
                );
                return Err(explain_session(*source).context(format!(
                    "System {} was registered but could not be recorded",
                    credentials.id
                )));
            }
            Err(err) => return Err(explain_session(err)),
        };

        println!("Registered system: {}", record.credentials.id);
        for registered in &record.products {
            println!(
                "  {} -> {} ({})",
                registered.product, registered.service.name, registered.service.url
            );
        }
        println!("State saved to {}", session.store().path().display());

        Ok(())
    }
}
