//! Client for the SUSE Customer Center connect API.
//!
//! # Example
//!
//! ```ignore
//! use crate::scc::{ProductRequest, SccClient, SystemRegistry};
//!
//! let client = SccClient::new()?;
//! let creds = client.announce(&regcode).await?;
//! let service = client.register_product(&creds.login, &creds.password, &request).await?;
//! client.deregister(&creds.login, &creds.password).await?;
//! ```

mod client;
mod error;
mod models;
mod transport;

#[cfg(test)]
pub use client::MockSystemRegistry;
pub use client::{SccClient, SystemRegistry};
pub use error::{SccError, StatusClass};
pub use models::{Credentials, ProductRequest, Service};
pub use transport::DEFAULT_BASE_URL;
