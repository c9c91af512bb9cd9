use pkg_constants::ingress::PROXY_PROTOCOL_TOKEN;
use pkg_state::Store;
use pkg_types::service::{IntOrString, Protocol};
use pkg_types::validate::parse_name_ns;
use tracing::{debug, warn};

use crate::model::{L4Backend, L4Service, ProxyProtocol};
use crate::synthesizer::Synthesizer;

impl<S: Store> Synthesizer<S> {
    /// L4 services described by the ConfigMap `configmap_name`.
    ///
    /// Each entry maps an external port to
    /// `<namespace>/<service>:<port|name>[:PROXY[:PROXY]]`. Entries on a
    /// reserved port, with a malformed reference or without endpoints are
    /// skipped. The result is sorted by external port.
    pub fn get_stream_services(
        &self,
        configmap_name: Option<&str>,
        proto: Protocol,
    ) -> Vec<L4Service> {
        let Some(configmap_name) = configmap_name.filter(|n| !n.is_empty()) else {
            return Vec::new();
        };
        debug!(
            "Obtaining information about {} stream services from ConfigMap {}",
            proto, configmap_name
        );

        if let Err(e) = parse_name_ns(configmap_name) {
            warn!("Error parsing ConfigMap reference {}: {}", configmap_name, e);
            return Vec::new();
        }
        let configmap = match self.store().get_config_map(configmap_name) {
            Ok(cm) => cm,
            Err(e) => {
                warn!("Error getting ConfigMap {}: {}", configmap_name, e);
                return Vec::new();
            }
        };

        let reserved = self.config().reserved_ports();
        let mut services = Vec::with_capacity(configmap.data.len());

        for (port, svc_ref) in &configmap.data {
            let Ok(external_port) = port.parse::<u16>() else {
                warn!("{} is not a valid {} port number", port, proto);
                continue;
            };
            if reserved.contains(&external_port) {
                warn!(
                    "Port {} cannot be used for {} stream services. It is reserved for the Ingress controller",
                    external_port, proto
                );
                continue;
            }
            if let Some(service) = self.stream_service(external_port, svc_ref, proto) {
                services.push(service);
            }
        }

        services.sort_by_key(|s| s.port);
        services
    }

    fn stream_service(
        &self,
        external_port: u16,
        svc_ref: &str,
        proto: Protocol,
    ) -> Option<L4Service> {
        let tokens: Vec<&str> = svc_ref.split(':').collect();
        if tokens.len() < 2 {
            warn!(
                "Invalid service reference {} for {} port {}",
                svc_ref, proto, external_port
            );
            return None;
        }
        let ns_name = tokens[0];
        let svc_port = tokens[1];

        let mut proxy_protocol = ProxyProtocol::default();
        if proto == Protocol::Tcp {
            let is_proxy = |i: usize| {
                tokens
                    .get(i)
                    .map(|t| t.eq_ignore_ascii_case(PROXY_PROTOCOL_TOKEN))
                    .unwrap_or(false)
            };
            proxy_protocol.decode = is_proxy(2);
            proxy_protocol.encode = tokens.len() == 4 && is_proxy(3);
        }

        let (svc_ns, svc_name) = match parse_name_ns(ns_name) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };
        let svc = match self.store().get_service(ns_name) {
            Ok(svc) => svc,
            Err(e) => {
                warn!("Error getting service {}: {}", ns_name, e);
                return None;
            }
        };

        let matching = match svc_port.parse::<i32>() {
            Ok(number) => {
                debug!(
                    "Searching endpoints with {} port number {} for service {}",
                    proto, number, ns_name
                );
                svc.spec
                    .ports
                    .iter()
                    .find(|sp| sp.port == number && sp.protocol == proto)
            }
            Err(_) => {
                debug!(
                    "Searching endpoints with {} port name {} for service {}",
                    proto, svc_port, ns_name
                );
                svc.spec
                    .ports
                    .iter()
                    .find(|sp| sp.name == svc_port && sp.protocol == proto)
            }
        };

        let Some(port) = matching else {
            warn!(
                "Service {} has no {} port matching {}",
                ns_name, proto, svc_port
            );
            return None;
        };

        let endpoints = self.resolve_endpoints(&svc, port, proto);
        if endpoints.is_empty() {
            warn!(
                "Service {} does not have any active endpoint for {} port {}",
                ns_name, proto, svc_port
            );
            return None;
        }

        Some(L4Service {
            port: external_port,
            backend: L4Backend {
                port: IntOrString::String(svc_port.to_string()),
                name: svc_name,
                namespace: svc_ns,
                protocol: proto,
                proxy_protocol,
            },
            endpoints,
            service: Some(svc),
        })
    }
}
