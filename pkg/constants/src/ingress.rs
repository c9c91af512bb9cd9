//! Naming and routing constants for configuration synthesis.

/// Catch-all location path.
pub const ROOT_LOCATION: &str = "/";

/// Name of the upstream that serves requests no rule matches.
pub const DEFAULT_UPSTREAM_NAME: &str = "upstream-default-backend";

/// Hostname of the catch-all server.
pub const DEFAULT_SERVER_NAME: &str = "_";

/// Prefix of upstreams materialized from a per-location default backend.
pub const CUSTOM_DEFAULT_BACKEND_PREFIX: &str = "custom-default-backend";

/// Session affinity type that tracks cookie locations.
pub const AFFINITY_COOKIE: &str = "cookie";

/// Canary affinity behaviour that keeps the canary's own affinity.
pub const CANARY_BEHAVIOR_LEGACY: &str = "legacy";

/// Token enabling PROXY protocol on a stream service reference.
pub const PROXY_PROTOCOL_TOKEN: &str = "PROXY";

// ─── Topology ─────────────────────────────────────────────────────────────

/// Traffic distribution requesting same-zone routing.
pub const TRAFFIC_DISTRIBUTION_PREFER_CLOSE: &str = "PreferClose";

/// Service annotation enabling topology aware routing per service.
pub const TOPOLOGY_MODE_ANNOTATION: &str = "service.kubernetes.io/topology-mode";

/// Value of [`TOPOLOGY_MODE_ANNOTATION`] that enables zone hints.
pub const TOPOLOGY_MODE_AUTO: &str = "auto";

// ─── Default certificate ──────────────────────────────────────────────────

/// Common name of the generated fallback certificate.
pub const FAKE_CERTIFICATE_CN: &str = "Kubernetes Ingress Controller Fake Certificate";

/// DNS name carried by the generated fallback certificate.
pub const FAKE_CERTIFICATE_DNS: &str = "ingress.local";

/// Validity of the generated fallback certificate, in days.
pub const FAKE_CERTIFICATE_VALID_DAYS: i64 = 365;
