use pkg_constants::ingress::ROOT_LOCATION;
use pkg_state::Store;
use pkg_types::ingress::{Ingress, PathType};
use pkg_types::secret::SSLCert;
use pkg_types::service::Protocol;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

use crate::model::{Configuration, Location, SSLPassthroughBackend};
use crate::synthesizer::Synthesizer;

/// Result of a synthesis pass.
#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    /// Every server hostname and alias, for TLS/SNI routing.
    pub hosts: BTreeSet<String>,
    pub configuration: Configuration,
}

impl<S: Store> Synthesizer<S> {
    /// Build the complete configuration for `ingresses`.
    ///
    /// Input order does not matter: identical inputs always produce an
    /// identical configuration.
    pub fn build_configuration(&self, ingresses: &[Ingress]) -> Synthesis {
        let ingresses = self.prepare_ingresses(ingresses);
        let (backends, mut servers) = self.assemble_backends(&ingresses);

        let mut hosts = BTreeSet::new();
        let mut passthrough_backends = Vec::new();

        for server in servers.iter_mut() {
            server.locations = update_server_locations(std::mem::take(&mut server.locations));

            hosts.insert(server.hostname.clone());
            hosts.extend(server.aliases.iter().cloned());

            if !server.ssl_passthrough {
                continue;
            }
            for loc in &server.locations {
                if loc.path != ROOT_LOCATION {
                    warn!(
                        "Ignoring SSL Passthrough for location {} in server {}",
                        loc.path, server.hostname
                    );
                    continue;
                }
                passthrough_backends.push(SSLPassthroughBackend {
                    backend: loc.backend.clone(),
                    hostname: server.hostname.clone(),
                    service: loc.service.clone(),
                    port: loc.port.clone(),
                });
                break;
            }
        }

        let config = self.config();
        let mut configuration = Configuration {
            backends,
            servers,
            tcp_endpoints: self
                .get_stream_services(config.tcp_config_map_name.as_deref(), Protocol::Tcp),
            udp_endpoints: self
                .get_stream_services(config.udp_config_map_name.as_deref(), Protocol::Udp),
            passthrough_backends,
            backend_config_checksum: self.store().get_backend_configuration().checksum,
            configuration_checksum: String::new(),
            default_ssl_certificate: self.default_ssl_certificate(),
            stream_snippets: get_stream_snippets(&ingresses),
        };
        configuration.configuration_checksum = configuration.compute_checksum();

        info!(
            "Synthesized configuration: {} backends, {} servers, {} TCP and {} UDP stream services (checksum {})",
            configuration.backends.len(),
            configuration.servers.len(),
            configuration.tcp_endpoints.len(),
            configuration.udp_endpoints.len(),
            configuration.configuration_checksum
        );

        Synthesis {
            hosts,
            configuration,
        }
    }

    /// The configured default certificate, else the generated fallback.
    pub fn default_ssl_certificate(&self) -> Option<SSLCert> {
        if let Some(key) = self.config().default_ssl_certificate.as_deref() {
            match self.store().get_local_ssl_cert(key) {
                Ok(cert) => return Some(cert),
                Err(e) => warn!(
                    "Error loading custom default certificate {}, falling back to generated default: {}",
                    key, e
                ),
            }
        }
        self.config().fake_certificate.clone()
    }
}

/// Normalize the prefix locations of a server.
///
/// The proxy redirects `/foo` to `/foo/` for a prefix location `/foo/`, so
/// a plain prefix location `/foo` becomes the prefix `/foo/` plus an exact
/// location `/foo`, unless an exact location for `/foo` already exists.
/// Root, non-prefix, rewritten and regex locations are kept as they are.
pub fn update_server_locations(locations: Vec<Location>) -> Vec<Location> {
    let exact_paths: HashSet<String> = locations
        .iter()
        .filter(|l| l.path_type == PathType::Exact)
        .map(|l| l.path.clone())
        .collect();

    let mut updated = Vec::with_capacity(locations.len());
    for mut loc in locations {
        if loc.path == ROOT_LOCATION {
            updated.push(loc);
            continue;
        }

        loc.ingress_path = loc.path.clone();

        if loc.path_type != PathType::Prefix || needs_rewrite(&loc) || loc.rewrite.use_regex {
            updated.push(loc);
            continue;
        }

        if exact_paths.contains(&loc.path) {
            loc.path = normalize_prefix_path(&loc.path);
            updated.push(loc);
            continue;
        }

        let mut exact = loc.clone();
        exact.path_type = PathType::Exact;

        debug!("Adding exact location {} next to prefix location", exact.path);
        loc.path = normalize_prefix_path(&loc.path);
        updated.push(loc);
        updated.push(exact);
    }
    updated
}

/// Append the trailing `/` a prefix location needs.
pub fn normalize_prefix_path(path: &str) -> String {
    if path == ROOT_LOCATION || path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// A rewrite target other than the path itself changes the request URI.
pub fn needs_rewrite(location: &Location) -> bool {
    !location.rewrite.target.is_empty() && location.rewrite.target != location.path
}

/// Stream snippets of all ingresses, in processing order.
pub fn get_stream_snippets(ingresses: &[Ingress]) -> Vec<String> {
    ingresses
        .iter()
        .map(|ing| ing.parsed_annotations.stream_snippet.clone())
        .filter(|s| !s.is_empty())
        .collect()
}
