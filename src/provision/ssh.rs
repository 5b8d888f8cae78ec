//! [`RemoteRunner`] over the system `ssh` client.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use super::ProvisionError;
use super::runner::RemoteRunner;

const SSH: &str = "ssh";

/// `ssh` exits with this code when it fails itself, before or while
/// connecting, rather than passing on the remote command's status.
const SSH_FAILURE: i32 = 255;

const DEFAULT_CONNECT_TIMEOUT_SECS: u32 = 30;

/// Runs scripts on `target` (`[user@]host`) through `ssh`.
#[derive(Debug, Clone)]
pub struct SshRunner {
    target: String,
    identity: Option<PathBuf>,
    port: Option<u16>,
    connect_timeout_secs: u32,
    sudo: bool,
    script_path: String,
}

impl SshRunner {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            identity: None,
            port: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            sudo: false,
            script_path: format!("/tmp/sccreg_{}.sh", Uuid::new_v4().simple()),
        }
    }

    pub fn identity(mut self, identity: Option<PathBuf>) -> Self {
        self.identity = identity;
        self
    }

    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn connect_timeout(mut self, secs: u32) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Run the script through `sudo`, for non-root logins.
    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Arguments to `ssh` for running `remote_command` on the target.
    fn args(&self, remote_command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
        ];
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        // Ends option parsing so a target starting with `-` stays a host.
        args.push("--".to_string());
        args.push(self.target.clone());
        args.push(remote_command.to_string());
        args
    }

    /// Remote side of an upload. The file is created private since it holds
    /// credentials.
    fn upload_command(path: &str) -> String {
        format!("umask 077; cat > '{path}'")
    }

    fn execute_command(&self, path: &str) -> String {
        if self.sudo {
            format!("sudo sh '{path}'")
        } else {
            format!("sh '{path}'")
        }
    }
}

fn spawn_error(source: std::io::Error) -> ProvisionError {
    ProvisionError::Spawn {
        program: SSH,
        source,
    }
}

#[async_trait]
impl RemoteRunner for SshRunner {
    fn script_path(&self) -> String {
        self.script_path.clone()
    }

    async fn upload(&self, path: &str, contents: &[u8]) -> Result<(), ProvisionError> {
        debug!(host = %self.target, path = path, bytes = contents.len(), "uploading");

        let mut child = Command::new(SSH)
            .args(self.args(&Self::upload_command(path)))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(contents).await.map_err(spawn_error)?;
        }

        let output = child.wait_with_output().await.map_err(spawn_error)?;
        if !output.status.success() {
            let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if output.status.code() == Some(SSH_FAILURE) {
                return Err(ProvisionError::Connect {
                    host: self.target.clone(),
                    reason,
                });
            }
            return Err(ProvisionError::Upload {
                path: path.to_string(),
                reason,
            });
        }

        Ok(())
    }

    async fn execute(&self, path: &str) -> Result<(), ProvisionError> {
        debug!(host = %self.target, path = path, "executing");

        // Script output goes straight to the user's terminal.
        let status = Command::new(SSH)
            .args(self.args(&self.execute_command(path)))
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(spawn_error)?;

        if !status.success() {
            return Err(ProvisionError::Script {
                path: path.to_string(),
                reason: status.to_string(),
            });
        }

        Ok(())
    }
}
