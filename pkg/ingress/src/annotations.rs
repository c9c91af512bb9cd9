use pkg_constants::ingress::DEFAULT_UPSTREAM_NAME;
use pkg_types::annotations::IngressAnnotations;
use tracing::debug;

use crate::model::Location;

/// Copy the location-level settings of an ingress onto `loc`.
///
/// The fallback upstream is reset to the default one; a custom default
/// backend replaces it later if it has endpoints.
pub fn location_apply_annotations(loc: &mut Location, anns: &IngressAnnotations) {
    loc.client_body_buffer_size = anns.client_body_buffer_size.clone();
    loc.configuration_snippet = anns.configuration_snippet.clone();
    loc.cors = anns.cors.clone();
    loc.enable_global_auth = anns.enable_global_auth;
    loc.http2_push_preload = anns.http2_push_preload;
    loc.proxy = anns.proxy.clone();
    loc.proxy_ssl = anns.proxy_ssl.clone();
    loc.rate_limit = anns.rate_limit.clone();
    loc.redirect = anns.redirect.clone();
    loc.rewrite = anns.rewrite.clone();
    loc.upstream_vhost = anns.upstream_vhost.clone();
    loc.denylist = anns.denylist.clone();
    loc.allowlist = anns.allowlist.clone();
    loc.denied = anns.denied.clone();
    loc.x_forwarded_prefix = anns.x_forwarded_prefix.clone();
    loc.use_port_in_redirects = anns.use_port_in_redirects;
    loc.connection = anns.connection.clone();
    loc.default_backend = anns.default_backend.clone();
    loc.backend_protocol = anns.backend_protocol.clone();
    loc.custom_http_errors = anns.custom_http_errors.clone();
    loc.disable_proxy_intercept_errors = anns.disable_proxy_intercept_errors;
    loc.satisfy = anns.satisfy.clone();
    loc.mirror = anns.mirror.clone();
    loc.default_backend_upstream_name = DEFAULT_UPSTREAM_NAME.to_string();
}

/// Clear every raw configuration snippet carried by an ingress.
pub fn drop_snippet_directives(anns: &mut IngressAnnotations, ing_key: &str) {
    if !anns.configuration_snippet.is_empty() {
        debug!(
            "Ingress {} tried to use configuration-snippet and the annotation is disabled by the admin. Removing the annotation",
            ing_key
        );
        anns.configuration_snippet.clear();
    }
    if !anns.server_snippet.is_empty() {
        debug!(
            "Ingress {} tried to use server-snippet and the annotation is disabled by the admin. Removing the annotation",
            ing_key
        );
        anns.server_snippet.clear();
    }
    if !anns.stream_snippet.is_empty() {
        debug!(
            "Ingress {} tried to use stream-snippet and the annotation is disabled by the admin. Removing the annotation",
            ing_key
        );
        anns.stream_snippet.clear();
    }
}
