use pkg_constants::ingress::{
    AFFINITY_COOKIE, CUSTOM_DEFAULT_BACKEND_PREFIX, DEFAULT_SERVER_NAME, DEFAULT_UPSTREAM_NAME,
    ROOT_LOCATION,
};
use pkg_state::Store;
use pkg_types::annotations::IngressAnnotations;
use pkg_types::ingress::{Ingress, PathType};
use pkg_types::service::Protocol;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use crate::annotations::location_apply_annotations;
use crate::canary::{merge_alternative_backends, non_canary_ingress_exists};
use crate::model::{Backend, IngressRef, Location, Server};
use crate::servers::rule_host;
use crate::synthesizer::Synthesizer;
use crate::upstreams::upstream_name;

impl<S: Store> Synthesizer<S> {
    /// Upstreams and servers for `ingresses`, sorted for stable output.
    ///
    /// An upstream can back locations in several servers when namespace,
    /// service and port are the same.
    pub fn get_backend_servers(&self, ingresses: &[Ingress]) -> (Vec<Backend>, Vec<Server>) {
        let ingresses = self.prepare_ingresses(ingresses);
        self.assemble_backends(&ingresses)
    }

    /// Same as [`get_backend_servers`](Self::get_backend_servers) for
    /// ingresses already in processing order.
    pub(crate) fn assemble_backends(&self, ingresses: &[Ingress]) -> (Vec<Backend>, Vec<Server>) {
        let du = self.default_upstream();
        let mut upstreams = self.create_upstreams(ingresses, du.clone());
        let mut servers = self.create_servers(ingresses, &upstreams, &du);
        let proxy_ssl_location_only = self
            .store()
            .get_backend_configuration()
            .proxy_ssl_location_only;

        let mut canary_ingresses = Vec::new();

        for ing in ingresses {
            if ing.parsed_annotations.canary.enabled {
                canary_ingresses.push(ing);
                continue;
            }
            self.attach_locations(ing, &mut upstreams, &mut servers, proxy_ssl_location_only);
        }

        if non_canary_ingress_exists(ingresses, &canary_ingresses) {
            for ing in &canary_ingresses {
                merge_alternative_backends(ing, &mut upstreams, &servers);
            }
        }

        self.materialize_custom_default_backends(&mut upstreams, &mut servers);
        mark_ssl_passthrough(&mut upstreams, &servers);

        let mut backends: Vec<Backend> = upstreams.into_values().collect();
        backends.sort_by(|a, b| a.name.cmp(&b.name));

        let mut servers: Vec<Server> = servers.into_values().collect();
        for server in servers.iter_mut() {
            sort_locations(&mut server.locations);
        }
        servers.sort_by(|a, b| a.hostname.cmp(&b.hostname));

        (backends, servers)
    }

    fn attach_locations(
        &self,
        ing: &Ingress,
        upstreams: &mut BTreeMap<String, Backend>,
        servers: &mut BTreeMap<String, Server>,
        proxy_ssl_location_only: bool,
    ) {
        let ing_key = ing.key();
        let anns = &ing.parsed_annotations;

        for rule in &ing.spec.rules {
            let host = rule_host(&rule.host);
            let server_key = if servers.contains_key(host) {
                host
            } else {
                DEFAULT_SERVER_NAME
            };
            let Some(server) = servers.get_mut(server_key) else {
                continue;
            };

            if rule.http.is_none() && host != DEFAULT_SERVER_NAME {
                debug!(
                    "Ingress {} does not contain any HTTP rule, using default backend",
                    ing_key
                );
                continue;
            }

            adopt_server_tls(server, anns, &ing_key, proxy_ssl_location_only);

            let Some(http) = &rule.http else {
                debug!(
                    "Ingress {} does not contain any HTTP rule, using default backend",
                    ing_key
                );
                continue;
            };

            for path in &http.paths {
                let Some(svc_backend) = &path.backend.service else {
                    debug!(
                        "Ingress {} and path {} does not contain a service backend, using default backend",
                        ing_key, path.path
                    );
                    continue;
                };

                let ups_name = upstream_name(&ing.namespace, svc_backend);
                let Some(ups) = upstreams.get_mut(&ups_name) else {
                    warn!("Upstream {} not found (Ingress {})", ups_name, ing_key);
                    continue;
                };
                if ups.no_server {
                    continue;
                }

                let nginx_path = if path.path.is_empty() {
                    ROOT_LOCATION
                } else {
                    path.path.as_str()
                };

                merge_location(server, ing, nginx_path, path.path_type, ups);
                apply_session_affinity(ups, anns, host, nginx_path, &server.aliases);
            }
        }
    }

    /// Clone the primary upstream of every location with a default backend
    /// override into a `custom-default-backend-*` upstream, when the
    /// override service has endpoints.
    fn materialize_custom_default_backends(
        &self,
        upstreams: &mut BTreeMap<String, Backend>,
        servers: &mut BTreeMap<String, Server>,
    ) {
        let mut custom: BTreeMap<String, Backend> = BTreeMap::new();

        for server in servers.values_mut() {
            for loc in server.locations.iter_mut() {
                let Some(def_svc) = loc.default_backend.as_ref() else {
                    continue;
                };
                if loc.backend == DEFAULT_UPSTREAM_NAME {
                    continue;
                }
                let Some(primary) = upstreams.get(&loc.backend) else {
                    continue;
                };

                let Some(port) = def_svc.spec.ports.first() else {
                    error!(
                        "Custom default backend service {} has no ports. Ignoring",
                        def_svc.key()
                    );
                    continue;
                };

                let endpoints = self.resolve_endpoints(def_svc, port, Protocol::Tcp);
                if endpoints.is_empty() {
                    continue;
                }

                let name = format!(
                    "{}-{}-{}",
                    CUSTOM_DEFAULT_BACKEND_PREFIX, def_svc.namespace, def_svc.name
                );
                if !custom.contains_key(&name) && !upstreams.contains_key(&name) {
                    debug!("Creating {} upstream based on default backend annotation", name);
                    let mut backend = primary.clone();
                    backend.name = name.clone();
                    backend.endpoints = endpoints;
                    custom.insert(name.clone(), backend);
                }

                loc.default_backend_upstream_name = name.clone();
                if primary.endpoints.is_empty() {
                    debug!(
                        "Upstream {} has no active endpoint, so using custom default backend for location {} in server {} (service {})",
                        primary.name,
                        loc.path,
                        server.hostname,
                        def_svc.key()
                    );
                    loc.backend = name;
                }
            }
        }

        upstreams.extend(custom);
    }
}

/// Mutual TLS and backend TLS settings of a server; the first ingress that
/// sets them wins.
fn adopt_server_tls(
    server: &mut Server,
    anns: &IngressAnnotations,
    ing_key: &str,
    proxy_ssl_location_only: bool,
) {
    if server.auth_tls_error.is_empty() && !anns.certificate_auth.auth_tls_error.is_empty() {
        server.auth_tls_error = anns.certificate_auth.auth_tls_error.clone();
    }

    if server.certificate_auth.ca_file_name.is_empty() {
        server.certificate_auth = anns.certificate_auth.clone();
        if !server.certificate_auth.secret.is_empty()
            && server.certificate_auth.ca_file_name.is_empty()
        {
            debug!(
                "Secret {} has no 'ca.crt' key, mutual authentication disabled for Ingress {}",
                server.certificate_auth.secret, ing_key
            );
        }
    } else {
        debug!(
            "Server {} is already configured for mutual authentication (Ingress {})",
            server.hostname, ing_key
        );
    }

    if proxy_ssl_location_only {
        return;
    }
    if server.proxy_ssl.ca_file_name.is_empty() {
        server.proxy_ssl = anns.proxy_ssl.clone();
        if !server.proxy_ssl.secret.is_empty() && server.proxy_ssl.ca_file_name.is_empty() {
            debug!(
                "Secret {} has no 'ca.crt' key, client cert authentication disabled for Ingress {}",
                server.proxy_ssl.secret, ing_key
            );
        }
    } else {
        debug!(
            "Server {} is already configured for client cert authentication (Ingress {})",
            server.hostname, ing_key
        );
    }
}

/// Bind `path` of `ing` to `ups` inside `server`.
///
/// Locations are identified by path and path type. A location still served
/// by a default upstream is taken over; one already bound to a real
/// upstream is left alone.
fn merge_location(
    server: &mut Server,
    ing: &Ingress,
    path: &str,
    path_type: PathType,
    ups: &Backend,
) {
    let ing_key = ing.key();
    let anns = &ing.parsed_annotations;
    let mut redirect_from_to_www = false;
    let mut add = true;

    for loc in server.locations.iter_mut() {
        if loc.path != path || loc.path_type != path_type {
            continue;
        }
        add = false;

        if !loc.is_def_backend {
            debug!(
                "Location {} already configured for server {} with upstream {} (Ingress {})",
                loc.path, server.hostname, loc.backend, ing_key
            );
            break;
        }

        debug!(
            "Replacing location {} for server {} with upstream {} to use upstream {} (Ingress {})",
            loc.path, server.hostname, loc.backend, ups.name, ing_key
        );
        loc.backend = ups.name.clone();
        loc.is_def_backend = false;
        loc.port = ups.port.clone();
        loc.service = ups.service.clone();
        loc.ingress = Some(IngressRef::from(ing));
        location_apply_annotations(loc, anns);
        redirect_from_to_www = loc.redirect.from_to_www;
        break;
    }

    if add {
        debug!(
            "Adding location {} for server {} with upstream {} (Ingress {})",
            path, server.hostname, ups.name, ing_key
        );
        let mut loc = Location {
            path: path.to_string(),
            path_type,
            backend: ups.name.clone(),
            is_def_backend: false,
            service: ups.service.clone(),
            port: ups.port.clone(),
            ingress: Some(IngressRef::from(ing)),
            ..Default::default()
        };
        location_apply_annotations(&mut loc, anns);
        redirect_from_to_www = loc.redirect.from_to_www;
        server.locations.push(loc);
    }

    if redirect_from_to_www {
        server.redirect_from_to_www = true;
    }
}

/// Affinity type and mode stick to the first ingress that sets them.
/// Cookie affinity also records the path under the host and its aliases.
fn apply_session_affinity(
    ups: &mut Backend,
    anns: &IngressAnnotations,
    host: &str,
    path: &str,
    aliases: &[String],
) {
    let affinity = &anns.session_affinity;
    if ups.session_affinity.affinity_type.is_empty() {
        ups.session_affinity.affinity_type = affinity.affinity_type.clone();
    }
    if ups.session_affinity.affinity_mode.is_empty() {
        ups.session_affinity.affinity_mode = affinity.mode.clone();
    }

    if affinity.affinity_type != AFFINITY_COOKIE {
        return;
    }

    let cookie = &affinity.cookie;
    if anns.rewrite.use_regex && cookie.path.is_empty() {
        warn!("session-cookie-path should be set when use-regex is true");
    }

    let csa = &mut ups.session_affinity.cookie_session_affinity;
    csa.name = cookie.name.clone();
    csa.expires = cookie.expires.clone();
    csa.max_age = cookie.max_age.clone();
    csa.secure = cookie.secure;
    csa.path = cookie.path.clone();
    csa.domain = cookie.domain.clone();
    csa.same_site = cookie.same_site.clone();
    csa.conditional_same_site_none = cookie.conditional_same_site_none;
    csa.change_on_failure = cookie.change_on_failure;

    for name in std::iter::once(host).chain(aliases.iter().map(String::as_str)) {
        csa.locations
            .entry(name.to_string())
            .or_default()
            .push(path.to_string());
    }
}

/// Upstreams behind the root location of a passthrough server are reached
/// by SNI only.
fn mark_ssl_passthrough(
    upstreams: &mut BTreeMap<String, Backend>,
    servers: &BTreeMap<String, Server>,
) {
    for server in servers.values().filter(|s| s.ssl_passthrough) {
        let Some(root) = server.locations.iter().find(|l| l.path == ROOT_LOCATION) else {
            continue;
        };
        if root.backend == DEFAULT_UPSTREAM_NAME {
            warn!(
                "Server {} has no default backend, ignoring SSL Passthrough",
                server.hostname
            );
            continue;
        }
        if let Some(ups) = upstreams.get_mut(&root.backend) {
            ups.ssl_passthrough = true;
        }
    }
}

/// Most specific path first: descending lexicographic order, then
/// stably by descending length.
pub(crate) fn sort_locations(locations: &mut [Location]) {
    locations.sort_by(|a, b| b.path.cmp(&a.path));
    locations.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
}
