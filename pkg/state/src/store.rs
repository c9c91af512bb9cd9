use pkg_types::config::BackendConfiguration;
use pkg_types::configmap::ConfigMap;
use pkg_types::endpoint::EndpointSlice;
use pkg_types::secret::SSLCert;
use pkg_types::service::Service;
use thiserror::Error;

/// Errors returned by [`Store`] lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {key:?} not found")]
    NotFound { kind: &'static str, key: String },

    #[error("invalid object key {0:?}")]
    InvalidKey(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: &str) -> Self {
        StoreError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

/// Read-only view of the cluster objects a synthesis pass consumes.
///
/// Keys are `namespace/name`. Implementations must tolerate concurrent
/// readers; synthesis never mutates the store.
pub trait Store: Send + Sync {
    fn get_service(&self, key: &str) -> Result<Service, StoreError>;

    fn get_config_map(&self, key: &str) -> Result<ConfigMap, StoreError>;

    /// All EndpointSlices owned by the service `key`.
    fn get_service_endpoint_slices(&self, key: &str) -> Result<Vec<EndpointSlice>, StoreError>;

    fn get_local_ssl_cert(&self, key: &str) -> Result<SSLCert, StoreError>;

    fn get_backend_configuration(&self) -> BackendConfiguration;
}
