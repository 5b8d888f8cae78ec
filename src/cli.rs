//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{
    AnnounceCmd, ConfigCmd, DeregisterCmd, DownCmd, ProvisionCmd, RegisterCmd, ScriptCmd,
    StatusCmd, UpCmd,
};

#[derive(Parser)]
#[command(name = "sccreg")]
#[command(about = "sccreg - register systems with SUSE Customer Center")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Announce a system and record it with its products
    Up(UpCmd),

    /// Deregister the recorded system
    Down(DownCmd),

    /// Show the recorded system
    Status(StatusCmd),

    /// Print the zypper setup script for the recorded system
    Script(ScriptCmd),

    /// Configure zypper credentials and services on a host over ssh
    Provision(ProvisionCmd),

    /// Announce a system and print its credentials (not recorded)
    Announce(AnnounceCmd),

    /// Activate products on a system given its credentials
    Register(RegisterCmd),

    /// Deregister a system given its credentials
    Deregister(DeregisterCmd),

    /// Manage configuration (regcode, server, products)
    Config(ConfigCmd),
}

impl Command {
    pub async fn execute(&self) -> anyhow::Result<()> {
        match self {
            Command::Up(cmd) => cmd.run().await,
            Command::Down(cmd) => cmd.run().await,
            Command::Status(cmd) => cmd.run().await,
            Command::Script(cmd) => cmd.run().await,
            Command::Provision(cmd) => cmd.run().await,
            Command::Announce(cmd) => cmd.run().await,
            Command::Register(cmd) => cmd.run().await,
            Command::Deregister(cmd) => cmd.run().await,
            Command::Config(cmd) => cmd.run().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_register_products() {
        let cli = Cli::try_parse_from([
            "sccreg",
            "register",
            "--login",
            "u1",
            "--password",
            "p1",
            "--product",
            "SLES/12.3/x86_64",
            "--product",
            "sle-module-hpc/12/x86_64:R2",
            "--regcode",
            "R1",
        ])
        .unwrap();

        let Command::Register(cmd) = cli.command else {
            panic!("expected register");
        };
        assert_eq!(cmd.products.len(), 2);
        assert_eq!(cmd.products[1].regcode.as_deref(), Some("R2"));
        assert_eq!(cmd.regcode.as_deref(), Some("R1"));
    }

    #[test]
    fn test_parse_rejects_bad_product() {
        let result = Cli::try_parse_from([
            "sccreg", "register", "--login", "u", "--password", "p", "--product", "SLES",
        ]);
        assert!(result.is_err());
    }
}
