use pkg_types::config::BackendConfiguration;
use pkg_types::configmap::ConfigMap;
use pkg_types::endpoint::EndpointSlice;
use pkg_types::ingress::Ingress;
use pkg_types::secret::SSLCert;
use pkg_types::service::Service;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::store::{Store, StoreError};

/// Serialized form of a store snapshot (YAML or JSON).
///
/// Example `snapshot.yaml`:
/// ```yaml
/// services:
///   - name: web
///     namespace: default
///     spec:
///       ports: [{ name: http, port: 80 }]
/// endpoint-slices:
///   - namespace: default
///     service_name: web
///     endpoints: [{ addresses: ["10.0.0.5"] }]
///     ports: [{ name: http, port: 80 }]
/// ingresses: []
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default, alias = "config-maps")]
    pub config_maps: Vec<ConfigMap>,
    #[serde(default, alias = "endpoint-slices")]
    pub endpoint_slices: Vec<EndpointSlice>,
    #[serde(default, alias = "ssl-certificates")]
    pub ssl_certificates: Vec<SSLCert>,
    #[serde(default)]
    pub ingresses: Vec<Ingress>,
    #[serde(default, alias = "backend-configuration")]
    pub backend_configuration: BackendConfiguration,
}

/// In-memory [`Store`] built from a [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    services: BTreeMap<String, Service>,
    config_maps: BTreeMap<String, ConfigMap>,
    endpoint_slices: BTreeMap<String, Vec<EndpointSlice>>,
    ssl_certificates: BTreeMap<String, SSLCert>,
    ingresses: Vec<Ingress>,
    backend_configuration: BackendConfiguration,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a snapshot by object key.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        for svc in snapshot.services {
            store.insert_service(svc);
        }
        for cm in snapshot.config_maps {
            store.insert_config_map(cm);
        }
        for eps in snapshot.endpoint_slices {
            store.insert_endpoint_slice(eps);
        }
        for cert in snapshot.ssl_certificates {
            store.insert_ssl_cert(cert);
        }
        store.ingresses = snapshot.ingresses;
        store.backend_configuration = snapshot.backend_configuration;
        store
    }

    /// Read a snapshot file. YAML is accepted, and JSON as a subset of it.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read snapshot {}: {}", path, e))?;
        let snapshot: Snapshot = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse snapshot {}: {}", path, e))?;
        info!(
            "Loaded snapshot {}: {} services, {} endpoint slices, {} ingresses",
            path,
            snapshot.services.len(),
            snapshot.endpoint_slices.len(),
            snapshot.ingresses.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn insert_service(&mut self, svc: Service) {
        self.services.insert(svc.key(), svc);
    }

    pub fn insert_config_map(&mut self, cm: ConfigMap) {
        self.config_maps.insert(cm.key(), cm);
    }

    pub fn insert_endpoint_slice(&mut self, eps: EndpointSlice) {
        self.endpoint_slices
            .entry(eps.service_key())
            .or_default()
            .push(eps);
    }

    pub fn insert_ssl_cert(&mut self, cert: SSLCert) {
        self.ssl_certificates.insert(cert.key(), cert);
    }

    pub fn insert_ingress(&mut self, ing: Ingress) {
        self.ingresses.push(ing);
    }

    pub fn set_backend_configuration(&mut self, cfg: BackendConfiguration) {
        self.backend_configuration = cfg;
    }

    /// Ingresses in snapshot order.
    pub fn ingresses(&self) -> &[Ingress] {
        &self.ingresses
    }
}

impl Store for SnapshotStore {
    fn get_service(&self, key: &str) -> Result<Service, StoreError> {
        self.services
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found("service", key))
    }

    fn get_config_map(&self, key: &str) -> Result<ConfigMap, StoreError> {
        self.config_maps
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found("configmap", key))
    }

    fn get_service_endpoint_slices(&self, key: &str) -> Result<Vec<EndpointSlice>, StoreError> {
        if !key.contains('/') {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.endpoint_slices.get(key).cloned().unwrap_or_default())
    }

    fn get_local_ssl_cert(&self, key: &str) -> Result<SSLCert, StoreError> {
        self.ssl_certificates
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found("certificate", key))
    }

    fn get_backend_configuration(&self) -> BackendConfiguration {
        self.backend_configuration.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
services:
  - name: web
    namespace: default
    spec:
      ports:
        - name: http
          port: 80
endpoint-slices:
  - name: web-abc
    namespace: default
    service_name: web
    endpoints:
      - addresses: ["10.0.0.5"]
    ports:
      - name: http
        port: 80
  - name: web-def
    namespace: default
    service_name: web
    endpoints:
      - addresses: ["10.0.0.6"]
backend-configuration:
  allow-snippet-annotations: true
  checksum: abc123
"#;

    #[test]
    fn indexes_snapshot_by_key() {
        let snapshot: Snapshot = serde_yaml::from_str(SNAPSHOT).unwrap();
        let store = SnapshotStore::from_snapshot(snapshot);

        let svc = store.get_service("default/web").unwrap();
        assert_eq!(svc.spec.ports[0].port, 80);

        let slices = store.get_service_endpoint_slices("default/web").unwrap();
        assert_eq!(slices.len(), 2);

        let cfg = store.get_backend_configuration();
        assert!(cfg.allow_snippet_annotations);
        assert_eq!(cfg.checksum, "abc123");
    }

    #[test]
    fn missing_objects_are_not_found() {
        let store = SnapshotStore::new();
        assert_eq!(
            store.get_service("default/missing"),
            Err(StoreError::not_found("service", "default/missing"))
        );
        assert!(store.get_config_map("default/tcp").is_err());
        assert!(store.get_local_ssl_cert("default/tls").is_err());
        assert!(store
            .get_service_endpoint_slices("default/missing")
            .unwrap()
            .is_empty());
        assert_eq!(
            store.get_service_endpoint_slices("nokey"),
            Err(StoreError::InvalidKey("nokey".to_string()))
        );
    }
}
