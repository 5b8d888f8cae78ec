//! SCC registration client: announce, product registration, deregistration.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use super::error::SccError;
use super::models::{AnnounceRequest, Credentials, ProductRequest, Service};
use super::transport::{Auth, HttpBackend, ReqwestBackend, Transport};

const ANNOUNCE_PATH: &str = "/subscriptions/systems";
const PRODUCTS_PATH: &str = "/systems/products";
const SYSTEMS_PATH: &str = "/systems";

/// The three calls a registration session needs from the server.
///
/// Implementations hold no per-system state; every call carries the
/// credentials it needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SystemRegistry: Send + Sync {
    /// Register a new system, authenticated by a regcode.
    async fn announce(&self, regcode: &str) -> Result<Credentials, SccError>;

    /// Activate a product on an announced system.
    async fn register_product(
        &self,
        login: &str,
        password: &str,
        product: &ProductRequest,
    ) -> Result<Service, SccError>;

    /// Remove the system from the server.
    async fn deregister(&self, login: &str, password: &str) -> Result<(), SccError>;
}

/// SCC connect API client.
pub struct SccClient<B = ReqwestBackend> {
    transport: Transport<B>,
}

impl SccClient {
    /// Client for a specific registration server, with an optional
    /// per-request timeout.
    pub fn with_base_url(base_url: &str, timeout: Option<Duration>) -> Result<Self, SccError> {
        Self::with_backend(ReqwestBackend::new(timeout)?, base_url)
    }
}

impl<B: HttpBackend> SccClient<B> {
    pub fn with_backend(backend: B, base_url: &str) -> Result<Self, SccError> {
        Ok(Self {
            transport: Transport::new(backend, base_url)?,
        })
    }
}

#[async_trait]
impl<B: HttpBackend> SystemRegistry for SccClient<B> {
    async fn announce(&self, regcode: &str) -> Result<Credentials, SccError> {
        let credentials: Credentials = self
            .transport
            .call(
                Method::POST,
                ANNOUNCE_PATH,
                Auth::bearer(regcode),
                &AnnounceRequest {},
            )
            .await?;

        debug!(system_id = credentials.id, "announced system");
        Ok(credentials)
    }

    async fn register_product(
        &self,
        login: &str,
        password: &str,
        product: &ProductRequest,
    ) -> Result<Service, SccError> {
        let service: Service = self
            .transport
            .call(
                Method::POST,
                PRODUCTS_PATH,
                Auth::basic(login, password),
                product,
            )
            .await?;

        debug!(
            identifier = %product.identifier,
            version = %product.version,
            arch = %product.arch,
            service = %service.name,
            "registered product"
        );
        Ok(service)
    }

    async fn deregister(&self, login: &str, password: &str) -> Result<(), SccError> {
        self.transport
            .call_no_content(Method::DELETE, SYSTEMS_PATH, Auth::basic(login, password))
            .await?;

        debug!(login = login, "deregistered system");
        Ok(())
    }
}
