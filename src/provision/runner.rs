//! Upload-and-execute of a script on a remote host.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ProvisionError;
use crate::retry::{RetryPolicy, retry};

/// Something that can place a file on a host and run it there.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteRunner: Send + Sync {
    /// Remote path the script is uploaded to.
    fn script_path(&self) -> String;

    async fn upload(&self, path: &str, contents: &[u8]) -> Result<(), ProvisionError>;

    async fn execute(&self, path: &str) -> Result<(), ProvisionError>;
}

/// Upload `lines` as a script, run it, then overwrite it with an empty file.
///
/// The upload is retried under `policy` when the host cannot be reached; the
/// execute step never is. The overwrite keeps credentials from lingering on
/// the host. It runs even when the script fails, and its own failure is only
/// logged.
pub async fn run_script<R>(
    runner: &R,
    lines: &[String],
    policy: &RetryPolicy,
) -> Result<(), ProvisionError>
where
    R: RemoteRunner + ?Sized,
{
    let path = runner.script_path();
    let mut script = lines.join("\n");
    script.push('\n');

    retry(policy, "upload script", || runner.upload(&path, script.as_bytes())).await?;
    debug!(path = %path, lines = lines.len(), "uploaded script");

    let result = runner.execute(&path).await;

    if let Err(err) = runner.upload(&path, b"").await {
        warn!(path = %path, error = %err, "failed to upload empty follow up script");
    }

    result
}
