//! Registration sessions: announce a system, activate its products, and
//! later deregister it, keeping the resulting credentials and services on
//! disk in between.
//!
//! The SCC client is stateless; this layer enforces the lifecycle
//! `Announced -> ProductsRegistered -> Deregistered` and owns retry policy.

mod product;
mod state;

pub use product::ProductSpec;
pub use state::{StateStore, SystemRecord, SystemState};

use thiserror::Error;
use tracing::{info, warn};

use crate::retry::{RetryPolicy, retry};
use crate::scc::{Credentials, SccError, Service, SystemRegistry};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to announce system")]
    Announce(#[source] SccError),

    #[error("failed to register product {product}")]
    RegisterProduct { product: String, source: SccError },

    #[error("failed to deregister system {id}")]
    Deregister { id: u64, source: SccError },

    #[error("system {0} is already registered; deregister it first")]
    AlreadyRegistered(u64),

    /// The server created a system but its credentials could not be stored.
    #[error("system {} was registered but could not be recorded", credentials.id)]
    Unsaved {
        credentials: Credentials,
        source: Box<SessionError>,
    },

    #[error("state file error")]
    State(#[from] std::io::Error),

    #[error("state file is not valid")]
    Corrupt(#[from] serde_json::Error),

    #[error("failed to encode state")]
    Encode(#[source] serde_json::Error),
}

impl SessionError {
    /// The client error behind a failed server call, if any.
    pub fn client_error(&self) -> Option<&SccError> {
        match self {
            Self::Announce(source)
            | Self::RegisterProduct { source, .. }
            | Self::Deregister { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result of tearing down a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeregisterOutcome {
    Deregistered,
    /// The server no longer knew the system (401/403/404).
    AlreadyDeregistered,
}

/// Drives a [`SystemRegistry`] through a system's lifecycle, persisting
/// progress to a [`StateStore`] after every successful step.
pub struct Session<R> {
    registry: R,
    store: StateStore,
    retry: RetryPolicy,
}

impl<R: SystemRegistry> Session<R> {
    pub fn new(registry: R, store: StateStore, retry: RetryPolicy) -> Self {
        Self {
            registry,
            store,
            retry,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Announce a system and activate `products` in order.
    ///
    /// Stops at the first failing product. Whatever was registered up to
    /// that point stays recorded so it can still be deregistered.
    pub async fn create(
        &self,
        regserver: &str,
        regcode: &str,
        products: &[ProductSpec],
    ) -> Result<SystemRecord, SessionError> {
        if let Some(existing) = self.store.load()? {
            if existing.state.is_active() {
                return Err(SessionError::AlreadyRegistered(existing.credentials.id));
            }
        }

        // Announcing creates a server-side system; fail before that if its
        // credentials would have nowhere to go.
        self.store.ensure_writable()?;

        // Not retried: a lost response may still have created a system.
        let credentials = self
            .registry
            .announce(regcode)
            .await
            .map_err(SessionError::Announce)?;

        info!(system_id = credentials.id, "registered system");

        let mut record = SystemRecord::new(regserver, credentials);
        self.save_announced(&record)?;

        for spec in products {
            let service = self.register(&record, regcode, spec).await?;
            info!(product = %spec, service = %service.name, "registered product");

            record.add_product(spec.clone(), service);
            self.store.save(&record)?;
        }

        Ok(record)
    }

    fn save_announced(&self, record: &SystemRecord) -> Result<(), SessionError> {
        self.store
            .save(record)
            .map_err(|source| SessionError::Unsaved {
                credentials: record.credentials.clone(),
                source: Box::new(source),
            })
    }

    async fn register(
        &self,
        record: &SystemRecord,
        regcode: &str,
        spec: &ProductSpec,
    ) -> Result<Service, SessionError> {
        let registry = &self.registry;
        let login = record.credentials.login.as_str();
        let password = record.credentials.password.as_str();
        let request = spec.to_request(regcode);
        let request = &request;

        retry(&self.retry, "register_product", move || {
            registry.register_product(login, password, request)
        })
        .await
        .map_err(|source| SessionError::RegisterProduct {
            product: spec.to_string(),
            source,
        })
    }

    /// Deregister the recorded system and mark it as such.
    ///
    /// A server that no longer recognizes the credentials counts as
    /// already deregistered rather than a failure.
    pub async fn destroy(
        &self,
        mut record: SystemRecord,
    ) -> Result<(DeregisterOutcome, SystemRecord), SessionError> {
        let registry = &self.registry;
        let login = record.credentials.login.as_str();
        let password = record.credentials.password.as_str();

        let result = retry(&self.retry, "deregister", move || {
            registry.deregister(login, password)
        })
        .await;

        let outcome = match result {
            Ok(()) => {
                info!(system_id = record.credentials.id, "deregistered system");
                DeregisterOutcome::Deregistered
            }
            Err(err) if err.is_already_deregistered() => {
                warn!(
                    system_id = record.credentials.id,
                    error = %err,
                    "system already deregistered"
                );
                DeregisterOutcome::AlreadyDeregistered
            }
            Err(source) => {
                return Err(SessionError::Deregister {
                    id: record.credentials.id,
                    source,
                });
            }
        };

        record.mark_deregistered();
        self.store.save(&record)?;

        Ok((outcome, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scc::{Credentials, MockSystemRegistry};
    use mockall::Sequence;
    use tempfile::{TempDir, tempdir};

    const REGSERVER: &str = "https://scc.suse.com/connect";

    fn creds() -> Credentials {
        Credentials {
            id: 42,
            login: "u1".to_string(),
            password: "p1".to_string(),
        }
    }

    fn service(name: &str) -> Service {
        Service {
            name: name.to_string(),
            url: format!("https://updates.example.com/{name}"),
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 1,
        }
    }

    fn session(registry: MockSystemRegistry) -> (Session<MockSystemRegistry>, TempDir) {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("system.json"));
        (Session::new(registry, store, fast_retry()), dir)
    }

    #[tokio::test]
    async fn test_create_resolves_per_product_regcode() {
        let mut registry = MockSystemRegistry::new();
        let mut seq = Sequence::new();
        registry
            .expect_announce()
            .withf(|regcode| regcode == "R1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(creds()));
        registry
            .expect_register_product()
            .withf(|login, password, req| {
                login == "u1" && password == "p1" && req.identifier == "SLES" && req.regcode == "R1"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(service("SLES-12.3")));
        registry
            .expect_register_product()
            .withf(|_, _, req| req.identifier == "sle-module-hpc" && req.regcode == "R2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(service("HPC-12")));

        let (session, _dir) = session(registry);
        let products = vec![
            ProductSpec::new("SLES", "12.3", "x86_64"),
            ProductSpec::new("sle-module-hpc", "12", "x86_64").with_regcode("R2"),
        ];

        let record = session.create(REGSERVER, "R1", &products).await.unwrap();

        assert_eq!(record.state, SystemState::ProductsRegistered);
        assert_eq!(record.products.len(), 2);
        assert_eq!(record.products[1].product, products[1]);
        assert_eq!(record.products[1].service.name, "HPC-12");
        assert_eq!(session.store().load().unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_failed_announce_stops_the_session() {
        let mut registry = MockSystemRegistry::new();
        registry
            .expect_announce()
            .times(1)
            .returning(|_| Err(SccError::Status(401)));
        registry.expect_register_product().never();
        registry.expect_deregister().never();

        let (session, _dir) = session(registry);
        let err = session
            .create(REGSERVER, "", &[ProductSpec::new("SLES", "12.3", "x86_64")])
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Announce(SccError::Status(401))));
        assert!(session.store().load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_product_keeps_partial_record() {
        let mut registry = MockSystemRegistry::new();
        registry.expect_announce().returning(|_| Ok(creds()));
        registry
            .expect_register_product()
            .withf(|_, _, req| req.identifier == "SLES")
            .returning(|_, _, _| Ok(service("SLES-12.3")));
        registry
            .expect_register_product()
            .withf(|_, _, req| req.identifier == "bogus")
            .times(1)
            .returning(|_, _, _| Err(SccError::Status(422)));

        let (session, _dir) = session(registry);
        let products = vec![
            ProductSpec::new("SLES", "12.3", "x86_64"),
            ProductSpec::new("bogus", "1", "x86_64"),
            ProductSpec::new("never", "1", "x86_64"),
        ];

        let err = session.create(REGSERVER, "R1", &products).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::RegisterProduct { ref product, source: SccError::Status(422) }
                if product == "bogus/1/x86_64"
        ));

        let stored = session.store().load().unwrap().unwrap();
        assert_eq!(stored.credentials.id, 42);
        assert_eq!(stored.products.len(), 1);
    }

    #[tokio::test]
    async fn test_product_registration_retries_transport_errors() {
        let mut registry = MockSystemRegistry::new();
        let mut seq = Sequence::new();
        registry.expect_announce().returning(|_| Ok(creds()));
        registry
            .expect_register_product()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {
                Err(SccError::Transport(
                    std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into(),
                ))
            });
        registry
            .expect_register_product()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(service("SLES-12.3")));

        let (session, _dir) = session(registry);
        let record = session
            .create(REGSERVER, "R1", &[ProductSpec::new("SLES", "12.3", "x86_64")])
            .await
            .unwrap();

        assert_eq!(record.products.len(), 1);
    }

    #[tokio::test]
    async fn test_create_refuses_when_system_active() {
        let mut registry = MockSystemRegistry::new();
        registry.expect_announce().never();

        let (session, _dir) = session(registry);
        session
            .store()
            .save(&SystemRecord::new(REGSERVER, creds()))
            .unwrap();

        let err = session.create(REGSERVER, "R1", &[]).await.unwrap_err();
        assert!(matches!(err, SessionError::AlreadyRegistered(42)));
    }

    #[tokio::test]
    async fn test_destroy_then_destroy_again() {
        let mut registry = MockSystemRegistry::new();
        let mut seq = Sequence::new();
        registry
            .expect_deregister()
            .withf(|login, password| login == "u1" && password == "p1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        registry
            .expect_deregister()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(SccError::Status(401)));

        let (session, _dir) = session(registry);
        let record = SystemRecord::new(REGSERVER, creds());

        let (outcome, record) = session.destroy(record).await.unwrap();
        assert_eq!(outcome, DeregisterOutcome::Deregistered);
        assert_eq!(record.state, SystemState::Deregistered);

        let (outcome, _) = session.destroy(record).await.unwrap();
        assert_eq!(outcome, DeregisterOutcome::AlreadyDeregistered);

        let stored = session.store().load().unwrap().unwrap();
        assert_eq!(stored.state, SystemState::Deregistered);
    }

    #[tokio::test]
    async fn test_destroy_server_error_is_fatal() {
        let mut registry = MockSystemRegistry::new();
        registry
            .expect_deregister()
            .times(1)
            .returning(|_, _| Err(SccError::Status(500)));

        let (session, _dir) = session(registry);
        let err = session
            .destroy(SystemRecord::new(REGSERVER, creds()))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Deregister { id: 42, .. }));
        assert!(session.store().load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_after_deregistered_record() {
        let mut registry = MockSystemRegistry::new();
        registry.expect_announce().times(1).returning(|_| Ok(creds()));

        let (session, _dir) = session(registry);
        let mut old = SystemRecord::new(REGSERVER, creds());
        old.mark_deregistered();
        session.store().save(&old).unwrap();

        let record = session.create(REGSERVER, "R1", &[]).await.unwrap();
        assert_eq!(record.state, SystemState::Announced);
    }
    #[tokio::test]
    async fn test_unwritable_state_stops_before_announce() {
        let mut registry = MockSystemRegistry::new();
        registry.expect_announce().never();

        let dir = tempdir().unwrap();
        let blocker = dir.path().join("state");
        std::fs::write(&blocker, "").unwrap();
        let store = StateStore::new(blocker.join("system.json"));
        let session = Session::new(registry, store, fast_retry());

        let err = session.create(REGSERVER, "R1", &[]).await.unwrap_err();
        assert!(matches!(err, SessionError::State(_)));
    }

    #[test]
    fn test_failed_first_save_keeps_credentials() {
        let dir = tempdir().unwrap();
        // A non-empty directory at the state path cannot be replaced by a file.
        let path = dir.path().join("system.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let session = Session::new(
            MockSystemRegistry::new(),
            StateStore::new(&path),
            fast_retry(),
        );
        let err = session
            .save_announced(&SystemRecord::new(REGSERVER, creds()))
            .unwrap_err();

        let SessionError::Unsaved { credentials, .. } = &err else {
            panic!("expected unsaved error, got {err:?}");
        };
        assert_eq!(credentials, &creds());
        assert_eq!(err.to_string(), "system 42 was registered but could not be recorded");
    }

    #[test]
    fn test_error_messages_do_not_repeat_source() {
        let err = SessionError::RegisterProduct {
            product: "SLES/12.3/x86_64".to_string(),
            source: SccError::Status(422),
        };
        assert_eq!(err.to_string(), "failed to register product SLES/12.3/x86_64");
        assert_eq!(err.client_error().and_then(SccError::status), Some(422));
        assert!(SessionError::AlreadyRegistered(1).client_error().is_none());
    }
}
