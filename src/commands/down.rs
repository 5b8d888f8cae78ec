//! Down command - deregister the recorded system.

use anyhow::Result;
use clap::Args;

use super::{StateArgs, client_for, explain_session};
use crate::config::LocalConfig;
use crate::session::{DeregisterOutcome, Session};

#[derive(Args)]
pub struct DownCmd {
    /// Delete the state file after deregistering
    #[arg(long)]
    pub forget: bool,

    #[command(flatten)]
    pub state: StateArgs,
}

impl DownCmd {
    pub async fn run(&self) -> Result<()> {
        let config = LocalConfig::load()?;
        let store = self.state.store()?;

        let record = match store.load()? {
            Some(record) if record.state.is_active() => record,
            Some(record) => {
                println!("System {} is already deregistered.", record.credentials.id);
                if self.forget {
                    store.clear()?;
                }
                return Ok(());
            }
            None => {
                println!("No registered system found.");
                return Ok(());
            }
        };

        // Deregister against the server the system was announced to.
        let client = client_for(&record.regserver, &config)?;
        let session = Session::new(client, store, config.retry);

        let (outcome, record) = session.destroy(record).await.map_err(explain_session)?;
        match outcome {
            DeregisterOutcome::Deregistered => {
                println!("Deregistered system {}", record.credentials.id)
            }
            DeregisterOutcome::AlreadyDeregistered => println!(
                "System {} was already gone from the server; marked as deregistered",
                record.credentials.id
            ),
        }

        if self.forget {
            session.store().clear()?;
            println!("Removed {}", session.store().path().display());
        }

        Ok(())
    }
}
