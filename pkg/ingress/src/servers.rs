use chrono::{Duration, Utc};
use pkg_constants::ingress::{DEFAULT_SERVER_NAME, ROOT_LOCATION};
use pkg_state::Store;
use pkg_types::ingress::{Ingress, PathType};
use pkg_types::secret::host_matches;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::annotations::location_apply_annotations;
use crate::model::{Backend, IngressRef, Location, Server};
use crate::synthesizer::Synthesizer;
use crate::upstreams::upstream_name;

/// Certificates closer than this to expiry are reported.
const CERT_EXPIRY_WARNING_DAYS: i64 = 10;

/// Host a rule applies to; an empty host means the catch-all server.
pub(crate) fn rule_host(host: &str) -> &str {
    if host.is_empty() {
        DEFAULT_SERVER_NAME
    } else {
        host
    }
}

fn root_location(backend: &str) -> Location {
    Location {
        path: ROOT_LOCATION.to_string(),
        path_type: PathType::Prefix,
        is_def_backend: true,
        backend: backend.to_string(),
        ..Default::default()
    }
}

impl<S: Store> Synthesizer<S> {
    /// One server per hostname referenced by a non-canary ingress, plus the
    /// catch-all server. Every server starts with a root location pointing
    /// at a default upstream.
    pub fn create_servers(
        &self,
        ingresses: &[Ingress],
        upstreams: &BTreeMap<String, Backend>,
        default_upstream: &Backend,
    ) -> BTreeMap<String, Server> {
        let mut servers = BTreeMap::new();
        let mut all_aliases: BTreeMap<String, Vec<String>> = BTreeMap::new();

        let mut catch_all = root_location(&default_upstream.name);
        catch_all.service = default_upstream.service.clone();
        servers.insert(
            DEFAULT_SERVER_NAME.to_string(),
            Server {
                hostname: DEFAULT_SERVER_NAME.to_string(),
                ssl_cert: self.default_ssl_certificate(),
                locations: vec![catch_all],
                ..Default::default()
            },
        );

        for ing in ingresses {
            let ing_key = ing.key();
            let anns = &ing.parsed_annotations;

            if anns.canary.enabled {
                debug!("Ingress {} is marked as canary, ignoring", ing_key);
                continue;
            }

            let mut initial_upstream = default_upstream.name.clone();

            let default_backend = ing
                .spec
                .default_backend
                .as_ref()
                .and_then(|b| b.service.as_ref())
                .and_then(|b| upstreams.get(&upstream_name(&ing.namespace, b)));
            if let Some(backend_upstream) = default_backend {
                initial_upstream = backend_upstream.name.clone();

                if ing.spec.rules.is_empty() {
                    self.take_over_catch_all(&mut servers, ing, backend_upstream);
                } else {
                    debug!(
                        "Ingress {} defines both a backend and rules. Using its backend as default upstream for all its rules",
                        ing_key
                    );
                }
            }

            for rule in &ing.spec.rules {
                let host = rule_host(&rule.host);
                if servers.contains_key(host) {
                    continue;
                }

                let mut loc = root_location(&initial_upstream);
                location_apply_annotations(&mut loc, anns);

                servers.insert(
                    host.to_string(),
                    Server {
                        hostname: host.to_string(),
                        locations: vec![loc],
                        ssl_passthrough: anns.ssl_passthrough,
                        ssl_ciphers: anns.ssl_cipher.ssl_ciphers.clone(),
                        ssl_prefer_server_ciphers: anns
                            .ssl_cipher
                            .ssl_prefer_server_ciphers
                            .clone(),
                        ..Default::default()
                    },
                );
            }
        }

        for ing in ingresses {
            if ing.parsed_annotations.canary.enabled {
                continue;
            }
            for rule in &ing.spec.rules {
                let host = rule_host(&rule.host);
                if let Some(server) = servers.get_mut(host) {
                    self.configure_server(server, ing, &mut all_aliases);
                }
            }
        }

        for (host, aliases) in all_aliases {
            let mut unique = BTreeSet::new();
            for alias in aliases {
                if alias == host {
                    continue;
                }
                if servers.contains_key(&alias) {
                    warn!(
                        "Alias {} of server {} is also a server hostname, removing it",
                        alias, host
                    );
                    continue;
                }
                unique.insert(alias);
            }
            if let Some(server) = servers.get_mut(&host) {
                server.aliases = unique.into_iter().collect();
            }
        }

        servers
    }

    /// An ingress with a default backend and no rules serves the catch-all
    /// location of the default server.
    fn take_over_catch_all(
        &self,
        servers: &mut BTreeMap<String, Server>,
        ing: &Ingress,
        backend_upstream: &Backend,
    ) {
        let Some(def_loc) = servers
            .get_mut(DEFAULT_SERVER_NAME)
            .and_then(|s| s.locations.first_mut())
        else {
            return;
        };
        if !def_loc.is_def_backend {
            debug!(
                "Catch-all server already served by another ingress, ignoring default backend of {}",
                ing.key()
            );
            return;
        }

        info!(
            "Ingress {} defines a backend but no rule. Using it to configure the catch-all server {}",
            ing.key(),
            DEFAULT_SERVER_NAME
        );
        def_loc.backend = backend_upstream.name.clone();
        def_loc.service = backend_upstream.service.clone();
        def_loc.port = backend_upstream.port.clone();
        def_loc.ingress = Some(IngressRef::from(ing));
        def_loc.is_def_backend = false;

        // redirect and rewrite would change the catch-all behaviour
        let redirect = def_loc.redirect.clone();
        let rewrite = def_loc.rewrite.clone();
        location_apply_annotations(def_loc, &ing.parsed_annotations);
        def_loc.redirect = redirect;
        def_loc.rewrite = rewrite;
    }

    /// Aliases, snippet, ciphers and certificate of `server`; the first
    /// ingress to set each one wins.
    fn configure_server(
        &self,
        server: &mut Server,
        ing: &Ingress,
        all_aliases: &mut BTreeMap<String, Vec<String>>,
    ) {
        let ing_key = ing.key();
        let anns = &ing.parsed_annotations;
        let host = server.hostname.clone();

        if server.aliases.is_empty() {
            server.aliases = anns.aliases.clone();
            let known = all_aliases.entry(host.clone()).or_default();
            if known.is_empty() {
                *known = anns.aliases.clone();
            }
        } else if !anns.aliases.is_empty() {
            warn!(
                "Aliases already configured for server {}, skipping (Ingress {})",
                host, ing_key
            );
        }

        if !anns.server_snippet.is_empty() {
            if server.server_snippet.is_empty() {
                server.server_snippet = anns.server_snippet.clone();
            } else {
                warn!(
                    "Server snippet already configured for server {}, skipping (Ingress {})",
                    host, ing_key
                );
            }
        }

        if server.ssl_ciphers.is_empty() {
            server.ssl_ciphers = anns.ssl_cipher.ssl_ciphers.clone();
        }
        if server.ssl_prefer_server_ciphers.is_empty() {
            server.ssl_prefer_server_ciphers = anns.ssl_cipher.ssl_prefer_server_ciphers.clone();
        }

        if server.ssl_cert.is_some() {
            return;
        }
        if ing.spec.tls.is_empty() {
            debug!("Ingress {} does not contain a TLS section", ing_key);
            return;
        }

        let Some(secret_name) = self.extract_tls_secret_name(&host, ing) else {
            debug!(
                "Host {} is not covered by a TLS secret of {}. Using default certificate",
                host, ing_key
            );
            return;
        };

        let secret_key = format!("{}/{}", ing.namespace, secret_name);
        let cert = match self.store().get_local_ssl_cert(&secret_key) {
            Ok(cert) => cert,
            Err(e) => {
                warn!(
                    "Error getting SSL certificate {}: {}. Using default certificate",
                    secret_key, e
                );
                return;
            }
        };

        if !cert.matches_host(&host) {
            warn!(
                "SSL certificate {} does not contain a Common Name or Subject Alternative Name for server {}. Using default certificate",
                secret_key, host
            );
            return;
        }

        if let Some(expires) = cert.expire_time {
            let now = Utc::now();
            if expires < now {
                warn!("SSL certificate for server {} expired ({})", host, expires);
            } else if expires < now + Duration::days(CERT_EXPIRY_WARNING_DAYS) {
                warn!(
                    "SSL certificate for server {} is about to expire ({})",
                    host, expires
                );
            }
        }

        server.ssl_cert = Some(cert);
    }

    /// Secret covering `host` in the TLS section of `ing`: a listed host
    /// that matches, else a listed secret whose certificate names match.
    pub fn extract_tls_secret_name(&self, host: &str, ing: &Ingress) -> Option<String> {
        let listed = ing
            .spec
            .tls
            .iter()
            .find(|tls| tls.hosts.iter().any(|h| host_matches(h, host)));
        if let Some(tls) = listed {
            return Some(tls.secret_name.clone()).filter(|s| !s.is_empty());
        }

        for tls in &ing.spec.tls {
            if tls.secret_name.is_empty() {
                continue;
            }
            let secret_key = format!("{}/{}", ing.namespace, tls.secret_name);
            match self.store().get_local_ssl_cert(&secret_key) {
                Ok(cert) if cert.matches_host(host) => {
                    debug!("Found SSL certificate matching host {}: {}", host, secret_key);
                    return Some(tls.secret_name.clone());
                }
                Ok(_) => {}
                Err(e) => warn!("Error getting SSL certificate {}: {}", secret_key, e),
            }
        }
        None
    }
}
