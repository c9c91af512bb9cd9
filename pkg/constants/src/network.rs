//! Network-related constants.

/// Default HTTP listen port of the proxy.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default HTTPS listen port of the proxy.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Default internal port used when SSL passthrough is enabled.
pub const DEFAULT_SSL_PROXY_PORT: u16 = 442;

/// Default health check port.
pub const DEFAULT_HEALTH_PORT: u16 = 10254;

/// Default port of the built-in default backend.
pub const DEFAULT_BACKEND_PORT: u16 = 8181;

/// Profiler port. Always reserved.
pub const PROFILER_PORT: u16 = 10245;

/// Status page port. Always reserved.
pub const STATUS_PORT: u16 = 10246;

/// Stream configuration port. Always reserved.
pub const STREAM_PORT: u16 = 10247;

/// Address of the static endpoint used when the default backend has none.
pub const DEFAULT_ENDPOINT_ADDRESS: &str = "127.0.0.1";
