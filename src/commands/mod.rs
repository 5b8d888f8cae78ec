//! CLI command implementations.

mod announce;
mod config;
mod deregister;
mod down;
mod provision;
mod register;
mod script;
mod status;
mod up;

pub use announce::AnnounceCmd;
pub use config::ConfigCmd;
pub use deregister::DeregisterCmd;
pub use down::DownCmd;
pub use provision::ProvisionCmd;
pub use register::RegisterCmd;
pub use script::ScriptCmd;
pub use status::StatusCmd;
pub use up::UpCmd;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::config::LocalConfig;
use crate::scc::{SccClient, SccError, StatusClass};
use crate::session::{SessionError, StateStore, SystemRecord};

/// Registration server override shared by commands that talk to SCC.
#[derive(Args)]
pub struct ServerArgs {
    /// Registration server URL (default: configured regserver)
    #[arg(long, env = "SCC_REGSERVER")]
    pub regserver: Option<String>,
}

impl ServerArgs {
    pub fn regserver<'a>(&'a self, config: &'a LocalConfig) -> &'a str {
        self.regserver.as_deref().unwrap_or(&config.regserver)
    }

    pub fn client(&self, config: &LocalConfig) -> Result<SccClient> {
        client_for(self.regserver(config), config)
    }
}

/// State file location shared by session commands.
#[derive(Args)]
pub struct StateArgs {
    /// State file (default: <data dir>/sccreg/system.json)
    #[arg(long = "state", env = "SCCREG_STATE")]
    pub path: Option<PathBuf>,
}

impl StateArgs {
    pub fn store(&self) -> Result<StateStore> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => StateStore::default_path().context("Could not determine data directory")?,
        };
        Ok(StateStore::new(path))
    }
}

pub fn client_for(regserver: &str, config: &LocalConfig) -> Result<SccClient> {
    SccClient::with_base_url(regserver, config.timeout())
        .with_context(|| format!("Failed to create client for {regserver}"))
}

/// Regcode from the command line or environment, else from config.
///
/// An explicitly empty regcode is passed through; the server decides.
pub fn resolve_regcode(flag: Option<&str>, config: &LocalConfig) -> Result<String> {
    match (flag, &config.regcode) {
        (Some(regcode), _) => Ok(regcode.to_string()),
        (None, Some(regcode)) => Ok(regcode.clone()),
        (None, None) => bail!(
            "No regcode given. Use --regcode, SCC_REGCODE or `sccreg config set-regcode`."
        ),
    }
}

/// Load the recorded system, requiring it to still be registered.
pub fn active_record(store: &StateStore) -> Result<SystemRecord> {
    let record = store
        .load()?
        .context("No registered system found. Run `sccreg up` first.")?;

    if !record.state.is_active() {
        bail!("System {} is deregistered.", record.credentials.id);
    }
    Ok(record)
}

fn hint(err: &SccError) -> Option<&'static str> {
    match err.status_class() {
        Some(StatusClass::Unauthorized) => Some("check the regcode or system credentials"),
        Some(StatusClass::NotFound) => Some("the system or product is unknown to the server"),
        Some(StatusClass::Client) => Some("check the product identifier, version and arch"),
        Some(StatusClass::Server) => Some("the registration server failed; try again later"),
        _ if err.is_transient() => Some("could not reach the registration server"),
        _ => None,
    }
}

/// Attach an operator hint to a client error based on its status class.
pub fn explain(err: SccError) -> anyhow::Error {
    match hint(&err) {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => err.into(),
    }
}

/// Like [`explain`], for session failures caused by a client error.
pub fn explain_session(err: SessionError) -> anyhow::Error {
    match err.client_error().and_then(hint) {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_regcode_precedence() {
        let mut config = LocalConfig::default();
        assert!(resolve_regcode(None, &config).is_err());

        config.set_regcode("CFG".to_string());
        assert_eq!(resolve_regcode(None, &config).unwrap(), "CFG");
        assert_eq!(resolve_regcode(Some("FLAG"), &config).unwrap(), "FLAG");
        assert_eq!(resolve_regcode(Some(""), &config).unwrap(), "");
    }

    #[test]
    fn test_explain_adds_hint() {
        let err = explain(SccError::Status(401));
        assert_eq!(err.to_string(), "check the regcode or system credentials");
        assert_eq!(
            err.root_cause().to_string(),
            "request failed with status 401"
        );

        let err = explain(SccError::Request("bad".to_string()));
        assert_eq!(err.to_string(), "invalid request: bad");
    }

    #[test]
    fn test_explain_session_keeps_chain() {
        let err = explain_session(SessionError::RegisterProduct {
            product: "SLES/15.5/x86_64".to_string(),
            source: SccError::Status(422),
        });
        let chain: Vec<_> = err.chain().map(ToString::to_string).collect();
        assert_eq!(
            chain,
            [
                "check the product identifier, version and arch",
                "failed to register product SLES/15.5/x86_64",
                "request failed with status 422",
            ]
        );

        let err = explain_session(SessionError::AlreadyRegistered(42));
        assert_eq!(err.chain().count(), 1);
    }

    #[test]
    fn test_active_record_requires_registration() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("system.json"));
        assert!(active_record(&store).is_err());
    }
}
