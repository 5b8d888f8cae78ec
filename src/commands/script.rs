//! Script command - print the zypper setup script for the recorded system.

use anyhow::Result;
use clap::Args;

use super::{StateArgs, active_record};
use crate::provision;

#[derive(Args)]
pub struct ScriptCmd {
    #[command(flatten)]
    pub state: StateArgs,
}

impl ScriptCmd {
    pub async fn run(&self) -> Result<()> {
        let record = active_record(&self.state.store()?)?;

        let lines = provision::build_script(
            &record.credentials.login,
            &record.credentials.password,
            &record.services(),
        )?;

        for line in lines {
            println!("{line}");
        }

        Ok(())
    }
}
