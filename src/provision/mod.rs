//! Remote zypper configuration for a registered system.
//!
//! Builds a shell script that installs the system and per-service
//! credentials under `/etc/zypp/credentials.d/` and (re)adds each
//! repository service, then runs it on the target through a
//! [`RemoteRunner`].

mod runner;
mod script;
mod ssh;

pub use runner::run_script;
pub use script::build_script;
pub use ssh::SshRunner;

use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid service name '{0}'")]
    InvalidServiceName(String),

    #[error("failed to run {program}")]
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },

    #[error("could not connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("failed to upload {path}: {reason}")]
    Upload { path: String, reason: String },

    #[error("script {path} failed: {reason}")]
    Script { path: String, reason: String },
}

impl Transient for ProvisionError {
    /// Only a failed connection is worth another attempt; anything past that
    /// point may already have touched the host.
    fn is_transient(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}
