use pkg_constants::ingress::{TOPOLOGY_MODE_ANNOTATION, TOPOLOGY_MODE_AUTO};
use pkg_state::Store;
use pkg_types::ingress::Ingress;
use pkg_types::service::{Protocol, Service, ServicePort};

use crate::annotations::drop_snippet_directives;
use crate::config::Config;
use crate::endpoints::endpoints_from_slices;
use crate::model::Endpoint;

/// Turns ingresses plus the cluster state behind a [`Store`] into a
/// [`Configuration`](crate::model::Configuration).
///
/// A pass only reads from the store and never fails; problems with
/// individual objects are logged and the object is skipped.
pub struct Synthesizer<S> {
    config: Config,
    store: S,
}

impl<S: Store> Synthesizer<S> {
    pub fn new(config: Config, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Zone used to filter endpoints of `svc`, if topology routing applies.
    pub(crate) fn zone_for(&self, svc: &Service) -> Option<&str> {
        let auto = svc
            .annotations
            .get(TOPOLOGY_MODE_ANNOTATION)
            .map(|mode| mode.eq_ignore_ascii_case(TOPOLOGY_MODE_AUTO))
            .unwrap_or(false);
        if self.config.enable_topology_aware_routing || auto {
            self.config.zone.as_deref().filter(|z| !z.is_empty())
        } else {
            None
        }
    }

    pub(crate) fn resolve_endpoints(
        &self,
        svc: &Service,
        port: &ServicePort,
        proto: Protocol,
    ) -> Vec<Endpoint> {
        endpoints_from_slices(svc, port, proto, self.zone_for(svc), |key| {
            self.store.get_service_endpoint_slices(key)
        })
    }

    /// Ingresses in processing order: oldest first, ties broken by key.
    /// Snippets are stripped here when the backend configuration forbids them.
    pub(crate) fn prepare_ingresses(&self, ingresses: &[Ingress]) -> Vec<Ingress> {
        let mut ordered = ingresses.to_vec();
        ordered.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.namespace.cmp(&b.namespace))
                .then_with(|| a.name.cmp(&b.name))
        });

        if !self.store.get_backend_configuration().allow_snippet_annotations {
            for ing in ordered.iter_mut() {
                let key = ing.key();
                drop_snippet_directives(&mut ing.parsed_annotations, &key);
            }
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pkg_state::SnapshotStore;
    use pkg_types::config::BackendConfiguration;

    fn make_ingress(ns: &str, name: &str, secs: i64) -> Ingress {
        let mut ing = Ingress {
            name: name.to_string(),
            namespace: ns.to_string(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            ..Default::default()
        };
        ing.parsed_annotations.server_snippet = "return 418;".to_string();
        ing
    }

    #[test]
    fn ingresses_sorted_by_age_then_key() {
        let synth = Synthesizer::new(Config::default(), SnapshotStore::new());
        let ordered = synth.prepare_ingresses(&[
            make_ingress("b", "web", 10),
            make_ingress("a", "web", 10),
            make_ingress("z", "old", 1),
        ]);
        let keys: Vec<String> = ordered.iter().map(|i| i.key()).collect();
        assert_eq!(keys, vec!["z/old", "a/web", "b/web"]);
    }

    #[test]
    fn snippets_dropped_unless_allowed() {
        let ing = make_ingress("default", "web", 0);

        let synth = Synthesizer::new(Config::default(), SnapshotStore::new());
        let denied = synth.prepare_ingresses(std::slice::from_ref(&ing));
        assert!(denied[0].parsed_annotations.server_snippet.is_empty());

        let mut store = SnapshotStore::new();
        store.set_backend_configuration(BackendConfiguration {
            allow_snippet_annotations: true,
            ..Default::default()
        });
        let synth = Synthesizer::new(Config::default(), store);
        let allowed = synth.prepare_ingresses(&[ing]);
        assert_eq!(allowed[0].parsed_annotations.server_snippet, "return 418;");
    }

    #[test]
    fn zone_requires_topology_routing_or_auto_mode() {
        let config = Config {
            zone: Some("zone-a".to_string()),
            ..Default::default()
        };
        let synth = Synthesizer::new(config, SnapshotStore::new());
        let mut svc = Service::default();
        assert_eq!(synth.zone_for(&svc), None);

        svc.annotations
            .insert(TOPOLOGY_MODE_ANNOTATION.to_string(), "Auto".to_string());
        assert_eq!(synth.zone_for(&svc), Some("zone-a"));
    }
}
