//! Folding canary ingresses into the alternative backends of the primary
//! upstreams serving the same host and path.

use pkg_constants::ingress::{
    CANARY_BEHAVIOR_LEGACY, DEFAULT_SERVER_NAME, DEFAULT_UPSTREAM_NAME, ROOT_LOCATION,
};
use pkg_types::ingress::{Ingress, IngressServiceBackend, PathType};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use crate::model::{Backend, Server};
use crate::servers::rule_host;
use crate::upstreams::upstream_name;

/// Canary ingresses only take effect next to at least one primary ingress.
pub fn non_canary_ingress_exists(ingresses: &[Ingress], canary_ingresses: &[&Ingress]) -> bool {
    ingresses.len() > canary_ingresses.len()
}

/// Whether `alternative` may become an alternative backend of `primary`.
/// The default upstream never takes alternatives.
pub fn can_merge_backend(primary: &Backend, alternative: &Backend) -> bool {
    primary.name != alternative.name
        && primary.name != DEFAULT_UPSTREAM_NAME
        && !primary.no_server
}

/// Register `alt` as an alternative backend of `primary`.
///
/// Returns true when `alt` is (now) listed by `primary`. Unless the canary
/// asks for the legacy behaviour, the canary inherits the primary's
/// session affinity.
pub fn merge_alternative_backend(ing: &Ingress, primary: &mut Backend, alt: &mut Backend) -> bool {
    if primary.no_server {
        return false;
    }

    if primary.alternative_backends.contains(&alt.name) {
        debug!(
            "Skip merge alternative backend {} into {}, it's already present",
            alt.name, primary.name
        );
        return true;
    }

    if ing.parsed_annotations.session_affinity.canary_behavior != CANARY_BEHAVIOR_LEGACY {
        alt.session_affinity = primary.session_affinity.clone();
    }

    primary.alternative_backends.push(alt.name.clone());
    true
}

/// Merge every backend of a canary ingress into the primaries serving the
/// same locations. Canary-only upstreams that end up unreferenced are
/// removed.
pub fn merge_alternative_backends(
    ing: &Ingress,
    upstreams: &mut BTreeMap<String, Backend>,
    servers: &BTreeMap<String, Server>,
) {
    let ing_key = ing.key();

    // catch-all canary
    let default_backend = ing
        .spec
        .default_backend
        .as_ref()
        .and_then(|b| b.service.as_ref());
    if let Some(backend) = default_backend {
        if let Some(server) = servers.get(DEFAULT_SERVER_NAME) {
            merge_into_server(ing, backend, server, None, servers, upstreams);
        }
    }

    for rule in &ing.spec.rules {
        let Some(http) = &rule.http else {
            continue;
        };
        let host = rule_host(&rule.host);

        for path in &http.paths {
            let Some(backend) = &path.backend.service else {
                continue;
            };
            let Some(server) = servers.get(host) else {
                error!(
                    "Cannot merge alternative backend {} into hostname {} that does not exist (Ingress {})",
                    upstream_name(&ing.namespace, backend),
                    host,
                    ing_key
                );
                continue;
            };
            let nginx_path = if path.path.is_empty() {
                ROOT_LOCATION
            } else {
                path.path.as_str()
            };
            merge_into_server(
                ing,
                backend,
                server,
                Some((nginx_path, path.path_type)),
                servers,
                upstreams,
            );
        }
    }
}

/// Merge the canary upstream of `backend` into the primaries of the
/// locations of `server`, restricted to `location` when given.
fn merge_into_server(
    ing: &Ingress,
    backend: &IngressServiceBackend,
    server: &Server,
    location: Option<(&str, PathType)>,
    servers: &BTreeMap<String, Server>,
    upstreams: &mut BTreeMap<String, Backend>,
) {
    let alt_name = upstream_name(&ing.namespace, backend);
    let Some(mut alt) = upstreams.remove(&alt_name) else {
        warn!("Alternative backend {} has already been removed", alt_name);
        return;
    };

    let mut merged = false;
    let mut alt_equals_primary = false;

    for loc in &server.locations {
        if loc.backend == alt.name {
            warn!(
                "Alternative upstream {} in Ingress {} is primary upstream in other Ingress for location {}{}",
                alt.name,
                ing.key(),
                server.hostname,
                loc.path
            );
            alt_equals_primary = true;
            break;
        }

        if let Some((path, path_type)) = location {
            if loc.path != path || loc.path_type != path_type {
                continue;
            }
        }

        let Some(primary) = upstreams.get_mut(&loc.backend) else {
            continue;
        };
        if can_merge_backend(primary, &alt) {
            debug!(
                "Matching backend {} found for alternative backend {}",
                primary.name, alt.name
            );
            merged |= merge_alternative_backend(ing, primary, &mut alt);
        }
    }

    // an upstream shared with a primary ingress, or bound to a location
    // anywhere, must outlive the merge
    let in_use = !alt.no_server
        || servers
            .values()
            .flat_map(|s| s.locations.iter())
            .any(|l| l.backend == alt.name);
    let referenced = upstreams
        .values()
        .any(|b| b.alternative_backends.contains(&alt.name));
    if alt_equals_primary || merged || in_use || referenced {
        upstreams.insert(alt_name, alt);
    } else {
        debug!(
            "Removing alternative backend {}, no primary upstream found (Ingress {})",
            alt_name,
            ing.key()
        );
    }
}
