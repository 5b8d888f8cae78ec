//! Status command - show the recorded system.

use anyhow::Result;
use clap::Args;

use super::StateArgs;
use crate::session::SystemState;

#[derive(Args)]
pub struct StatusCmd {
    /// Print the system password
    #[arg(long)]
    pub show_password: bool,

    #[command(flatten)]
    pub state: StateArgs,
}

impl StatusCmd {
    pub async fn run(&self) -> Result<()> {
        let store = self.state.store()?;

        let Some(record) = store.load()? else {
            println!("No registered system found.");
            return Ok(());
        };

        println!("State:     {}", store.path().display());
        println!("System:    {}", record.credentials.id);
        println!("Server:    {}", record.regserver);
        let status = match record.state {
            SystemState::Announced => "announced",
            SystemState::ProductsRegistered => "products registered",
            SystemState::Deregistered => "deregistered",
        };
        println!("Status:    {status}");
        println!("Announced: {}", record.announced_at.format("%Y-%m-%d %H:%M:%S UTC"));
        if let Some(at) = record.deregistered_at {
            println!("Removed:   {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!("Login:     {}", record.credentials.login);
        if self.show_password {
            println!("Password:  {}", record.credentials.password);
        }

        if record.products.is_empty() {
            println!("\nNo products registered.");
        } else {
            println!("\nProducts:");
            for registered in &record.products {
                println!(
                    "  {:<40} {} ({})",
                    registered.product.to_string(),
                    registered.service.name,
                    registered.service.url
                );
            }
        }

        Ok(())
    }
}
