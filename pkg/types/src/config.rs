use serde::{Deserialize, Serialize};

/// Listen ports section of the controller config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListenPortsFile {
    #[serde(default)]
    pub http: Option<u16>,
    #[serde(default)]
    pub https: Option<u16>,
    #[serde(default, alias = "ssl-proxy")]
    pub ssl_proxy: Option<u16>,
    #[serde(default)]
    pub health: Option<u16>,
    #[serde(default)]
    pub default: Option<u16>,
}

/// Controller configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// default-service: ingress/default-http-backend
/// tcp-services-configmap: ingress/tcp-services
/// udp-services-configmap: ingress/udp-services
/// default-ssl-certificate: ingress/default-tls
/// listen-ports:
///   http: 80
///   https: 443
///   health: 10254
/// enable-topology-aware-routing: true
/// zone: eu-west-1a
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfigFile {
    #[serde(default, alias = "default-service")]
    pub default_service: Option<String>,
    #[serde(default, alias = "tcp-services-configmap")]
    pub tcp_services_configmap: Option<String>,
    #[serde(default, alias = "udp-services-configmap")]
    pub udp_services_configmap: Option<String>,
    #[serde(default, alias = "default-ssl-certificate")]
    pub default_ssl_certificate: Option<String>,
    #[serde(default, alias = "listen-ports")]
    pub listen_ports: Option<ListenPortsFile>,
    #[serde(default, alias = "disable-service-external-name")]
    pub disable_service_external_name: Option<bool>,
    #[serde(default, alias = "enable-topology-aware-routing")]
    pub enable_topology_aware_routing: Option<bool>,
    #[serde(default)]
    pub zone: Option<String>,
}

/// Global proxy settings that influence synthesis, served by the Store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfiguration {
    #[serde(default, alias = "allow-snippet-annotations")]
    pub allow_snippet_annotations: bool,
    #[serde(default, alias = "proxy-ssl-location-only")]
    pub proxy_ssl_location_only: bool,
    #[serde(default)]
    pub checksum: String,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_case_keys() {
        let yaml = r#"
default-service: ingress/default-http-backend
tcp-services-configmap: ingress/tcp
listen-ports:
  http: 8080
  ssl-proxy: 4442
enable-topology-aware-routing: true
zone: zone-a
"#;
        let cfg: ControllerConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            cfg.default_service.as_deref(),
            Some("ingress/default-http-backend")
        );
        assert_eq!(cfg.tcp_services_configmap.as_deref(), Some("ingress/tcp"));
        let ports = cfg.listen_ports.unwrap();
        assert_eq!(ports.http, Some(8080));
        assert_eq!(ports.ssl_proxy, Some(4442));
        assert_eq!(ports.https, None);
        assert_eq!(cfg.enable_topology_aware_routing, Some(true));
        assert_eq!(cfg.zone.as_deref(), Some("zone-a"));
    }

    #[test]
    fn missing_file_yields_default() {
        let cfg: ControllerConfigFile =
            load_config_file("/nonexistent/ingress-sync/config.yaml").unwrap();
        assert!(cfg.default_service.is_none());
    }
}
