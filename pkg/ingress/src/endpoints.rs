use pkg_constants::ingress::TRAFFIC_DISTRIBUTION_PREFER_CLOSE;
use pkg_state::StoreError;
use pkg_types::endpoint::EndpointSlice;
use pkg_types::service::{IntOrString, Protocol, Service, ServicePort, ServiceType};
use pkg_types::validate::validate_dns1123_subdomain;
use std::collections::HashSet;
use std::net::IpAddr;
use tracing::{debug, error, warn};

use crate::model::Endpoint;

/// Resolve `port` of `svc` into a deduplicated list of ready endpoints.
///
/// ExternalName services yield one synthetic endpoint pointing at the
/// external name. Regular services are resolved from their EndpointSlices,
/// filtered to `zone` when every endpoint carries zone hints. All failures
/// produce an empty list.
pub fn endpoints_from_slices<F>(
    svc: &Service,
    port: &ServicePort,
    proto: Protocol,
    zone: Option<&str>,
    get_slices: F,
) -> Vec<Endpoint>
where
    F: Fn(&str) -> Result<Vec<EndpointSlice>, StoreError>,
{
    let svc_key = svc.key();

    if svc.spec.service_type == ServiceType::ExternalName {
        return external_name_endpoint(svc, port).into_iter().collect();
    }

    debug!(
        "Getting endpoints from EndpointSlices for service {} and port {}",
        svc_key, port
    );
    let slices = match get_slices(&svc_key) {
        Ok(slices) => slices,
        Err(e) => {
            warn!("Error obtaining endpoints for service {}: {}", svc_key, e);
            return Vec::new();
        }
    };

    let zone = zone.filter(|z| use_zone_hints(svc, &slices, z));
    if let Some(z) = zone {
        debug!(
            "All endpoints carry zone hints, using zone {} for service {}",
            z, svc_key
        );
    }

    let single_port = svc.spec.ports.len() <= 1;
    let mut seen = HashSet::new();
    let mut endpoints = Vec::new();

    for slice in &slices {
        let ports = candidate_ports(slice, port, proto, single_port);

        for ep in &slice.endpoints {
            if !ep.is_ready() {
                continue;
            }
            if let Some(z) = zone {
                if !ep.hinted_for(z) {
                    continue;
                }
            }
            for target in &ports {
                for address in &ep.addresses {
                    if !seen.insert((address.clone(), *target)) {
                        continue;
                    }
                    endpoints.push(Endpoint {
                        address: address.clone(),
                        port: target.to_string(),
                        target: ep.target_ref.clone(),
                    });
                }
            }
        }
    }

    debug!("Endpoints found for service {}: {:?}", svc_key, endpoints);
    endpoints
}

fn external_name_endpoint(svc: &Service, port: &ServicePort) -> Option<Endpoint> {
    let svc_key = svc.key();
    let external_name = svc.spec.external_name.clone().unwrap_or_default();
    let ip = external_name.parse::<IpAddr>().ok();

    if external_name == "localhost" || ip.map(|ip| ip.is_loopback()).unwrap_or(false) {
        error!(
            "Invalid attempt to use localhost name {} in {}",
            external_name, svc_key
        );
        return None;
    }

    debug!("Ingress using service {} of type ExternalName", svc_key);
    if ip.is_none() {
        let name = external_name.strip_suffix('.').unwrap_or(&external_name);
        if let Err(e) = validate_dns1123_subdomain(name) {
            error!("Invalid DNS name {}: {}", external_name, e);
            return None;
        }
    }

    Some(Endpoint {
        address: external_name,
        port: port.effective_target_port().int_value().to_string(),
        target: None,
    })
}

/// Zone filtering is all-or-nothing for a service: every endpoint must carry
/// a hint, and under `PreferClose` at least one must be hinted for `zone`.
fn use_zone_hints(svc: &Service, slices: &[EndpointSlice], zone: &str) -> bool {
    let mut endpoints = slices.iter().flat_map(|s| s.endpoints.iter());

    let prefer_close = svc.spec.traffic_distribution.as_deref()
        == Some(TRAFFIC_DISTRIBUTION_PREFER_CLOSE);
    if prefer_close && !endpoints.clone().any(|ep| ep.hinted_for(zone)) {
        debug!("No endpoints found for zone {} in service {}", zone, svc.key());
        return false;
    }

    endpoints.all(|ep| ep.has_zone_hints())
}

/// Ports of `slice` that carry traffic for the service port `port`.
fn candidate_ports(
    slice: &EndpointSlice,
    port: &ServicePort,
    proto: Protocol,
    single_port: bool,
) -> Vec<i32> {
    let numeric_target = match port.effective_target_port() {
        IntOrString::Int(n) if n > 0 => Some(n),
        _ => None,
    };

    if slice.ports.is_empty() {
        return numeric_target.into_iter().collect();
    }

    let mut ports = Vec::new();
    for ep_port in &slice.ports {
        if ep_port.protocol.unwrap_or_default() != proto {
            continue;
        }
        let ep_name = ep_port.name.as_deref().unwrap_or("");
        let matched = if port.name.is_empty() {
            single_port
        } else {
            port.name == ep_name
        };
        let target = match (matched, ep_port.port) {
            (true, Some(p)) if p > 0 => Some(p),
            _ => numeric_target,
        };
        if let Some(p) = target {
            ports.push(p);
        }
    }
    ports
}
