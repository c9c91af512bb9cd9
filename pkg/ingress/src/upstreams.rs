use anyhow::{Result, anyhow, bail};
use pkg_constants::ingress::DEFAULT_UPSTREAM_NAME;
use pkg_state::{Store, StoreError};
use pkg_types::ingress::{Ingress, IngressServiceBackend, ServiceBackendPort};
use pkg_types::service::{IntOrString, Protocol, ServicePort, ServiceType};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use crate::model::{Backend, Endpoint, TrafficShapingPolicy};
use crate::synthesizer::Synthesizer;

/// Canonical upstream name: `<namespace>-<service>-<port>`.
pub fn upstream_name(namespace: &str, service: &IngressServiceBackend) -> String {
    format!("{}-{}-{}", namespace, service.name, service.port.as_key())
}

impl<S: Store> Synthesizer<S> {
    /// The upstream serving requests no rule matches.
    ///
    /// Always has at least one endpoint: the static default endpoint stands
    /// in when the default service is unset, missing or has no endpoints.
    pub fn default_upstream(&self) -> Backend {
        let mut upstream = Backend::new(DEFAULT_UPSTREAM_NAME);

        let Some(svc_key) = self.config().default_service.as_deref() else {
            upstream.endpoints.push(self.config().default_endpoint());
            return upstream;
        };

        let svc = match self.store().get_service(svc_key) {
            Ok(svc) => svc,
            Err(e) => {
                warn!("Error getting default backend {}: {}", svc_key, e);
                upstream.endpoints.push(self.config().default_endpoint());
                return upstream;
            }
        };

        let mut endpoints = match svc.spec.ports.first() {
            Some(port) => self.resolve_endpoints(&svc, port, Protocol::Tcp),
            None => {
                warn!("Default backend service {} has no ports", svc_key);
                Vec::new()
            }
        };
        if endpoints.is_empty() {
            warn!("Service {} does not have any active endpoint", svc_key);
            endpoints.push(self.config().default_endpoint());
        }

        upstream.port = svc
            .spec
            .ports
            .first()
            .map(|p| IntOrString::Int(p.port))
            .unwrap_or_default();
        upstream.service = Some(svc);
        upstream.endpoints = endpoints;
        upstream
    }

    /// One upstream per distinct service port referenced by `ingresses`,
    /// seeded with the default upstream.
    pub fn create_upstreams(
        &self,
        ingresses: &[Ingress],
        default_upstream: Backend,
    ) -> BTreeMap<String, Backend> {
        let mut upstreams = BTreeMap::new();
        upstreams.insert(DEFAULT_UPSTREAM_NAME.to_string(), default_upstream);

        for ing in ingresses {
            let default_backend = ing
                .spec
                .default_backend
                .as_ref()
                .and_then(|b| b.service.as_ref());
            let paths = ing
                .spec
                .rules
                .iter()
                .filter_map(|rule| rule.http.as_ref())
                .flat_map(|http| http.paths.iter())
                .filter_map(|path| path.backend.service.as_ref());

            for backend in default_backend.into_iter().chain(paths) {
                let name = upstream_name(&ing.namespace, backend);
                if upstreams.contains_key(&name) {
                    continue;
                }
                debug!("Creating upstream {}", name);
                let upstream = self.new_upstream(ing, &name, backend);
                upstreams.insert(name, upstream);
            }
        }

        upstreams
    }

    fn new_upstream(&self, ing: &Ingress, name: &str, backend: &IngressServiceBackend) -> Backend {
        let anns = &ing.parsed_annotations;
        let svc_key = format!("{}/{}", ing.namespace, backend.name);

        let mut upstream = Backend::new(name);
        upstream.port = backend.port.to_int_or_string();
        upstream.upstream_hash_by = anns.upstream_hash_by.clone();
        upstream.load_balancing = anns.load_balancing.clone();

        if anns.service_upstream {
            match self.service_cluster_endpoint(&svc_key, &backend.port) {
                Ok(endpoint) => upstream.endpoints = vec![endpoint],
                Err(e) => error!(
                    "Failed to determine a suitable ClusterIP endpoint for service {}: {}",
                    svc_key, e
                ),
            }
        }

        if anns.canary.enabled {
            upstream.no_server = true;
            upstream.traffic_shaping_policy = TrafficShapingPolicy::from(&anns.canary);
        }

        if upstream.endpoints.is_empty() {
            match self.service_endpoints(&svc_key, &backend.port) {
                Ok(endpoints) => upstream.endpoints = endpoints,
                Err(e) => warn!("Error obtaining endpoints for service {}: {}", svc_key, e),
            }
        }

        match self.store().get_service(&svc_key) {
            Ok(svc) => upstream.service = Some(svc),
            Err(e) => warn!("Error obtaining service {}: {}", svc_key, e),
        }

        upstream
    }

    /// Endpoints of the service port matching `backend_port` by number,
    /// target port or name.
    pub(crate) fn service_endpoints(
        &self,
        svc_key: &str,
        backend_port: &ServiceBackendPort,
    ) -> Result<Vec<Endpoint>, StoreError> {
        let svc = self.store().get_service(svc_key)?;
        let port_key = backend_port.as_key();
        debug!("Obtaining ports information for service {}", svc_key);

        if svc.spec.service_type == ServiceType::ExternalName {
            if self.config().disable_service_external_name {
                warn!(
                    "Service {} of type ExternalName not allowed due to controller configuration",
                    svc_key
                );
                return Ok(Vec::new());
            }
            let target = IntOrString::parse(&port_key);
            let port = ServicePort {
                protocol: Protocol::Tcp,
                port: target.int_value(),
                target_port: Some(target),
                ..Default::default()
            };
            let endpoints = self.resolve_endpoints(&svc, &port, Protocol::Tcp);
            if endpoints.is_empty() {
                warn!("Service {} does not have any active endpoint", svc_key);
            }
            return Ok(endpoints);
        }

        let matching = svc.spec.ports.iter().find(|sp| {
            sp.port.to_string() == port_key
                || sp.effective_target_port().to_string() == port_key
                || sp.name == port_key
        });
        let Some(port) = matching else {
            warn!("Service {} has no port matching {}", svc_key, port_key);
            return Ok(Vec::new());
        };

        let endpoints = self.resolve_endpoints(&svc, port, Protocol::Tcp);
        if endpoints.is_empty() {
            warn!("Service {} does not have any active endpoint", svc_key);
        }
        Ok(endpoints)
    }

    /// Single endpoint at the service's cluster IP, for `service-upstream`.
    fn service_cluster_endpoint(
        &self,
        svc_key: &str,
        backend_port: &ServiceBackendPort,
    ) -> Result<Endpoint> {
        let svc = self
            .store()
            .get_service(svc_key)
            .map_err(|_| anyhow!("service {} does not exist", svc_key))?;

        let cluster_ip = match svc.cluster_ip.as_deref() {
            Some(ip) if !ip.is_empty() && ip != "None" => ip.to_string(),
            _ => bail!("no ClusterIP found for service {}", svc_key),
        };

        let port = if backend_port.name.is_empty() {
            backend_port.number
        } else {
            match svc.spec.ports.iter().find(|sp| sp.name == backend_port.name) {
                Some(sp) => sp.port,
                None => bail!(
                    "service {} does not have a port named {}",
                    svc.name,
                    backend_port.name
                ),
            }
        };

        Ok(Endpoint {
            address: cluster_ip,
            port: port.to_string(),
            target: None,
        })
    }
}
