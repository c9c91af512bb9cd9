use pkg_constants::network::{
    DEFAULT_BACKEND_PORT, DEFAULT_ENDPOINT_ADDRESS, DEFAULT_HEALTH_PORT, DEFAULT_HTTP_PORT,
    DEFAULT_HTTPS_PORT, DEFAULT_SSL_PROXY_PORT, PROFILER_PORT, STATUS_PORT, STREAM_PORT,
};
use pkg_types::config::ControllerConfigFile;
use pkg_types::secret::SSLCert;
use std::collections::BTreeSet;

use crate::model::Endpoint;

/// Ports the proxy listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenPorts {
    pub http: u16,
    pub https: u16,
    pub ssl_proxy: u16,
    pub health: u16,
    pub default: u16,
}

impl Default for ListenPorts {
    fn default() -> Self {
        Self {
            http: DEFAULT_HTTP_PORT,
            https: DEFAULT_HTTPS_PORT,
            ssl_proxy: DEFAULT_SSL_PROXY_PORT,
            health: DEFAULT_HEALTH_PORT,
            default: DEFAULT_BACKEND_PORT,
        }
    }
}

/// Runtime settings of a synthesis pass.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// `namespace/name` of the service backing the default upstream.
    pub default_service: Option<String>,
    /// `namespace/name` of the ConfigMap describing TCP stream services.
    pub tcp_config_map_name: Option<String>,
    /// `namespace/name` of the ConfigMap describing UDP stream services.
    pub udp_config_map_name: Option<String>,
    /// `namespace/name` of the secret holding the default certificate.
    pub default_ssl_certificate: Option<String>,
    pub listen_ports: ListenPorts,
    pub disable_service_external_name: bool,
    pub enable_topology_aware_routing: bool,
    /// Zone the controller runs in, used for topology hints.
    pub zone: Option<String>,
    /// Certificate served when no default certificate can be loaded.
    pub fake_certificate: Option<SSLCert>,
}

impl Config {
    /// Build a config from a controller config file, filling gaps with defaults.
    pub fn from_file(file: &ControllerConfigFile) -> Self {
        let defaults = ListenPorts::default();
        let listen_ports = match &file.listen_ports {
            Some(p) => ListenPorts {
                http: p.http.unwrap_or(defaults.http),
                https: p.https.unwrap_or(defaults.https),
                ssl_proxy: p.ssl_proxy.unwrap_or(defaults.ssl_proxy),
                health: p.health.unwrap_or(defaults.health),
                default: p.default.unwrap_or(defaults.default),
            },
            None => defaults,
        };
        Self {
            default_service: file.default_service.clone(),
            tcp_config_map_name: file.tcp_services_configmap.clone(),
            udp_config_map_name: file.udp_services_configmap.clone(),
            default_ssl_certificate: file.default_ssl_certificate.clone(),
            listen_ports,
            disable_service_external_name: file.disable_service_external_name.unwrap_or(false),
            enable_topology_aware_routing: file.enable_topology_aware_routing.unwrap_or(false),
            zone: file.zone.clone(),
            fake_certificate: None,
        }
    }

    /// Ports that stream services may not claim.
    pub fn reserved_ports(&self) -> BTreeSet<u16> {
        let p = &self.listen_ports;
        [
            p.http,
            p.https,
            p.ssl_proxy,
            p.health,
            p.default,
            PROFILER_PORT,
            STATUS_PORT,
            STREAM_PORT,
        ]
        .into_iter()
        .collect()
    }

    /// Static endpoint used when the default backend has nothing better.
    pub fn default_endpoint(&self) -> Endpoint {
        Endpoint {
            address: DEFAULT_ENDPOINT_ADDRESS.to_string(),
            port: self.listen_ports.default.to_string(),
            target: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::config::ListenPortsFile;

    #[test]
    fn reserved_ports_include_fixed_ports() {
        let cfg = Config::default();
        let reserved = cfg.reserved_ports();
        for port in [80, 443, 442, 10254, 8181, 10245, 10246, 10247] {
            assert!(reserved.contains(&port), "port {} should be reserved", port);
        }
        assert!(!reserved.contains(&8080));
    }

    #[test]
    fn from_file_overrides_listen_ports() {
        let file = ControllerConfigFile {
            default_service: Some("ingress/default-backend".to_string()),
            listen_ports: Some(ListenPortsFile {
                health: Some(9000),
                ..Default::default()
            }),
            enable_topology_aware_routing: Some(true),
            ..Default::default()
        };
        let cfg = Config::from_file(&file);
        assert_eq!(cfg.listen_ports.health, 9000);
        assert_eq!(cfg.listen_ports.http, DEFAULT_HTTP_PORT);
        assert!(cfg.enable_topology_aware_routing);
        assert!(cfg.reserved_ports().contains(&9000));
        assert!(!cfg.reserved_ports().contains(&DEFAULT_HEALTH_PORT));
    }

    #[test]
    fn default_endpoint_uses_default_port() {
        let cfg = Config::default();
        let ep = cfg.default_endpoint();
        assert_eq!(ep.address, "127.0.0.1");
        assert_eq!(ep.port, "8181");
    }
}
