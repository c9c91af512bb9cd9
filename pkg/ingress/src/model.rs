//! Render-ready configuration model produced by a synthesis pass.
//!
//! Everything here is rebuilt from scratch on every pass and serialized
//! deterministically: ordered collections only, no hash maps.

use pkg_types::annotations::{
    AuthTlsConfig, CanaryConfig, ConnectionConfig, CorsConfig, MirrorConfig, ProxyConfig,
    ProxySslConfig, RateLimitConfig, RedirectConfig, RewriteConfig, SourceRange,
    UpstreamHashByConfig,
};
use pkg_types::endpoint::ObjectReference;
use pkg_types::ingress::{Ingress, PathType};
use pkg_types::secret::SSLCert;
use pkg_types::service::{IntOrString, Protocol, Service};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::warn;

/// Root aggregate handed to the template renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Every upstream referenced by a server location, including the default one.
    pub backends: Vec<Backend>,
    pub servers: Vec<Server>,
    pub tcp_endpoints: Vec<L4Service>,
    pub udp_endpoints: Vec<L4Service>,
    /// Backends reached by SNI without TLS termination.
    pub passthrough_backends: Vec<SSLPassthroughBackend>,
    /// Checksum of the global backend configuration, supplied by the store.
    pub backend_config_checksum: String,
    /// Digest of this configuration, used to skip redundant reloads.
    pub configuration_checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ssl_certificate: Option<SSLCert>,
    pub stream_snippets: Vec<String>,
}

impl Configuration {
    /// SHA-256 over the serialized configuration and the default
    /// certificate digest. The stored checksum field itself is excluded.
    pub fn compute_checksum(&self) -> String {
        let mut hasher = Sha256::new();
        let mut unsummed = self.clone();
        unsummed.configuration_checksum.clear();
        unsummed.default_ssl_certificate = None;
        match serde_json::to_vec(&unsummed) {
            Ok(bytes) => hasher.update(&bytes),
            Err(e) => warn!("Unable to serialize configuration for checksum: {}", e),
        }
        if let Some(cert) = &self.default_ssl_certificate {
            hasher.update(cert.pem_sha.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// A backend address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ObjectReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieSessionAffinity {
    pub name: String,
    pub expires: String,
    pub max_age: String,
    /// Paths using the cookie, keyed by hostname or alias.
    pub locations: BTreeMap<String, Vec<String>>,
    pub secure: bool,
    pub path: String,
    pub domain: String,
    pub same_site: String,
    pub conditional_same_site_none: bool,
    pub change_on_failure: bool,
}

/// Session affinity of an upstream. Set by the first ingress that
/// configures it; later ingresses do not change type or mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAffinityConfig {
    pub affinity_type: String,
    pub affinity_mode: String,
    pub cookie_session_affinity: CookieSessionAffinity,
}

/// How traffic is steered to an alternative (canary) backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficShapingPolicy {
    /// Share of `weight_total` sent to the alternative backend.
    pub weight: i32,
    pub weight_total: i32,
    pub header: String,
    pub header_value: String,
    pub header_pattern: String,
    pub cookie: String,
}

impl From<&CanaryConfig> for TrafficShapingPolicy {
    fn from(canary: &CanaryConfig) -> Self {
        Self {
            weight: canary.weight,
            weight_total: canary.weight_total,
            header: canary.header.clone(),
            header_value: canary.header_value.clone(),
            header_pattern: canary.header_pattern.clone(),
            cookie: canary.cookie.clone(),
        }
    }
}

/// A load-balanced pool of endpoints for one service port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    /// `<namespace>-<service>-<port>`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Service>,
    pub port: IntOrString,
    pub ssl_passthrough: bool,
    pub endpoints: Vec<Endpoint>,
    pub session_affinity: SessionAffinityConfig,
    pub upstream_hash_by: UpstreamHashByConfig,
    pub load_balancing: String,
    /// Set on canary backends. They are reachable only through the
    /// `alternative_backends` of a primary backend.
    pub no_server: bool,
    pub traffic_shaping_policy: TrafficShapingPolicy,
    pub alternative_backends: Vec<String>,
}

impl Backend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Owning ingress of a location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRef {
    pub namespace: String,
    pub name: String,
}

impl From<&Ingress> for IngressRef {
    fn from(ing: &Ingress) -> Self {
        Self {
            namespace: ing.namespace.clone(),
            name: ing.name.clone(),
        }
    }
}

/// A URI inside a server, with the settings its ingress annotations carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub path_type: PathType,
    /// True while the location still routes to the default upstream.
    pub is_def_backend: bool,
    pub ingress: Option<IngressRef>,
    /// Path as written in the ingress, before normalization.
    pub ingress_path: String,
    pub backend: String,
    #[serde(skip)]
    pub service: Option<Service>,
    pub port: IntOrString,
    pub upstream_vhost: String,
    pub denied: Option<String>,
    pub cors: CorsConfig,
    pub enable_global_auth: bool,
    pub http2_push_preload: bool,
    pub rate_limit: RateLimitConfig,
    pub redirect: RedirectConfig,
    pub rewrite: RewriteConfig,
    pub denylist: SourceRange,
    pub allowlist: SourceRange,
    pub proxy: ProxyConfig,
    pub proxy_ssl: ProxySslConfig,
    pub use_port_in_redirects: bool,
    pub configuration_snippet: String,
    pub connection: ConnectionConfig,
    pub client_body_buffer_size: String,
    #[serde(skip)]
    pub default_backend: Option<Service>,
    /// Upstream used when `backend` has no endpoints.
    pub default_backend_upstream_name: String,
    pub x_forwarded_prefix: String,
    pub backend_protocol: String,
    pub custom_http_errors: Vec<i32>,
    pub disable_proxy_intercept_errors: bool,
    pub satisfy: String,
    pub mirror: MirrorConfig,
}

/// A virtual host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub hostname: String,
    pub ssl_passthrough: bool,
    pub ssl_cert: Option<SSLCert>,
    /// Most specific path first.
    pub locations: Vec<Location>,
    pub aliases: Vec<String>,
    pub redirect_from_to_www: bool,
    pub certificate_auth: AuthTlsConfig,
    pub proxy_ssl: ProxySslConfig,
    pub server_snippet: String,
    pub ssl_ciphers: String,
    pub ssl_prefer_server_ciphers: String,
    pub auth_tls_error: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyProtocol {
    pub decode: bool,
    pub encode: bool,
}

/// The service behind a stream port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct L4Backend {
    pub port: IntOrString,
    pub name: String,
    pub namespace: String,
    pub protocol: Protocol,
    pub proxy_protocol: ProxyProtocol,
}

/// A raw TCP/UDP port forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct L4Service {
    /// Port exposed by the proxy.
    pub port: u16,
    pub backend: L4Backend,
    pub endpoints: Vec<Endpoint>,
    #[serde(skip)]
    pub service: Option<Service>,
}

/// A hostname routed by SNI to a backend that terminates TLS itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SSLPassthroughBackend {
    #[serde(skip)]
    pub service: Option<Service>,
    pub port: IntOrString,
    pub backend: String,
    pub hostname: String,
}
