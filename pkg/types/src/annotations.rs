//! Pre-parsed per-ingress annotation settings.
//!
//! Parsing the raw annotation strings happens upstream of synthesis; these
//! structs carry the result. Most of them are copied verbatim onto locations
//! or servers, only a few (canary, affinity, rewrite, redirect, passthrough,
//! default backend) influence how the routing table is built.

use serde::{Deserialize, Serialize};

use crate::service::Service;

/// Canary traffic split settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanaryConfig {
    pub enabled: bool,
    pub weight: i32,
    pub weight_total: i32,
    pub header: String,
    pub header_value: String,
    pub header_pattern: String,
    pub cookie: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityCookie {
    pub name: String,
    pub expires: String,
    pub max_age: String,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub same_site: String,
    pub conditional_same_site_none: bool,
    pub change_on_failure: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionAffinityAnnotation {
    /// `cookie` or empty.
    pub affinity_type: String,
    /// `balanced` or `persistent`.
    pub mode: String,
    /// `legacy` keeps the canary backend's own affinity on merge.
    pub canary_behavior: String,
    pub cookie: AffinityCookie,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub target: String,
    pub ssl_redirect: bool,
    pub force_ssl_redirect: bool,
    pub preserve_trailing_slash: bool,
    pub app_root: String,
    pub use_regex: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub url: String,
    pub code: i32,
    pub from_to_www: bool,
}

/// Mutual TLS (client certificate) settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthTlsConfig {
    pub secret: String,
    pub ca_file_name: String,
    pub ca_sha: String,
    pub verify_client: String,
    pub verify_depth: i32,
    pub error_page: String,
    pub pass_certificate_to_upstream: bool,
    pub match_cn: String,
    /// Reason the secret could not be used, if any.
    pub auth_tls_error: String,
}

/// TLS settings for connections to the backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySslConfig {
    pub secret: String,
    pub ca_file_name: String,
    pub ciphers: String,
    pub protocols: String,
    pub server_name: String,
    pub verify: String,
    pub verify_depth: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub body_size: String,
    pub connect_timeout: i32,
    pub send_timeout: i32,
    pub read_timeout: i32,
    pub buffers_number: i32,
    pub buffer_size: String,
    pub cookie_domain: String,
    pub cookie_path: String,
    pub next_upstream: String,
    pub next_upstream_timeout: i32,
    pub next_upstream_tries: i32,
    pub proxy_redirect_from: String,
    pub proxy_redirect_to: String,
    pub request_buffering: String,
    pub proxy_buffering: String,
    pub proxy_http_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamHashByConfig {
    pub upstream_hash_by: String,
    pub upstream_hash_by_subset: bool,
    pub upstream_hash_by_subset_size: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_origin: Vec<String>,
    pub allow_methods: String,
    pub allow_headers: String,
    pub expose_headers: String,
    pub allow_credentials: bool,
    pub max_age: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub connections: i32,
    pub rps: i32,
    pub rpm: i32,
    pub burst_multiplier: i32,
    pub limit_rate_after: i32,
    pub limit_rate: i32,
    pub allowlist: Vec<String>,
}

/// CIDR ranges for allow/deny lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceRange {
    pub cidr: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslCipherConfig {
    pub ssl_ciphers: String,
    pub ssl_prefer_server_ciphers: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub header: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub source: String,
    pub request_body: String,
    pub target: String,
    pub host: String,
}

/// All parsed annotations of one ingress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressAnnotations {
    pub aliases: Vec<String>,
    pub allowlist: SourceRange,
    pub backend_protocol: String,
    pub canary: CanaryConfig,
    pub certificate_auth: AuthTlsConfig,
    pub client_body_buffer_size: String,
    pub configuration_snippet: String,
    pub connection: ConnectionConfig,
    pub cors: CorsConfig,
    pub custom_http_errors: Vec<i32>,
    /// Service to use when the location's own backend has no endpoints.
    pub default_backend: Option<Service>,
    pub denied: Option<String>,
    pub denylist: SourceRange,
    pub disable_proxy_intercept_errors: bool,
    pub enable_global_auth: bool,
    pub http2_push_preload: bool,
    pub load_balancing: String,
    pub mirror: MirrorConfig,
    pub proxy: ProxyConfig,
    pub proxy_ssl: ProxySslConfig,
    pub rate_limit: RateLimitConfig,
    pub redirect: RedirectConfig,
    pub rewrite: RewriteConfig,
    pub satisfy: String,
    pub server_snippet: String,
    pub service_upstream: bool,
    pub session_affinity: SessionAffinityAnnotation,
    pub ssl_cipher: SslCipherConfig,
    pub ssl_passthrough: bool,
    pub stream_snippet: String,
    pub upstream_hash_by: UpstreamHashByConfig,
    pub upstream_vhost: String,
    pub use_port_in_redirects: bool,
    pub x_forwarded_prefix: String,
}
