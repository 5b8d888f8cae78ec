//! Persisted registration state.
//!
//! One JSON file holds the system currently managed by this machine:
//! ```text
//! {data_dir}/sccreg/system.json
//! ```
//! It contains the system password, so it is written owner-only.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::SessionError;
use super::product::ProductSpec;
use crate::scc::{Credentials, Service};

const STATE_DIR: &str = "sccreg";
const STATE_FILE: &str = "system.json";

/// Lifecycle of a recorded system. "Unregistered" is the absence of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemState {
    Announced,
    ProductsRegistered,
    Deregistered,
}

impl SystemState {
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Deregistered)
    }
}

/// A product activated on the system, with the service it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredProduct {
    pub product: ProductSpec,
    pub service: Service,
}

/// Everything needed to reconfigure or deregister a system later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemRecord {
    /// Registration server the system was announced to.
    pub regserver: String,
    pub credentials: Credentials,
    #[serde(default)]
    pub products: Vec<RegisteredProduct>,
    pub state: SystemState,
    pub announced_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deregistered_at: Option<DateTime<Utc>>,
}

impl SystemRecord {
    pub fn new(regserver: &str, credentials: Credentials) -> Self {
        Self {
            regserver: regserver.to_string(),
            credentials,
            products: Vec::new(),
            state: SystemState::Announced,
            announced_at: Utc::now(),
            deregistered_at: None,
        }
    }

    pub fn add_product(&mut self, product: ProductSpec, service: Service) {
        self.products.push(RegisteredProduct { product, service });
        self.state = SystemState::ProductsRegistered;
    }

    pub fn mark_deregistered(&mut self) {
        self.state = SystemState::Deregistered;
        self.deregistered_at = Some(Utc::now());
    }

    pub fn services(&self) -> Vec<Service> {
        self.products.iter().map(|p| p.service.clone()).collect()
    }
}

/// JSON file store for a single [`SystemRecord`].
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(STATE_DIR).join(STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, `None` if nothing was stored yet.
    pub fn load(&self) -> Result<Option<SystemRecord>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Check that a record could be saved, creating the directory if needed.
    pub fn ensure_writable(&self) -> Result<(), SessionError> {
        std::fs::create_dir_all(self.dir())?;
        NamedTempFile::new_in(self.dir())?;
        Ok(())
    }

    /// Replace the stored record atomically.
    pub fn save(&self, record: &SystemRecord) -> Result<(), SessionError> {
        std::fs::create_dir_all(self.dir())?;

        let mut tmp = NamedTempFile::new_in(self.dir())?;
        restrict_permissions(tmp.as_file())?;
        write_record(&mut tmp, record)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Write errors stay I/O errors; only a value serde cannot encode is `Encode`.
fn write_record(writer: impl Write, record: &SystemRecord) -> Result<(), SessionError> {
    serde_json::to_writer_pretty(writer, record).map_err(|e| {
        if e.is_io() {
            SessionError::State(e.into())
        } else {
            SessionError::Encode(e)
        }
    })
}

#[cfg(unix)]
fn restrict_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}
