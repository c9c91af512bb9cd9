//! Filesystem path constants.

// ─── TLS ──────────────────────────────────────────────────────────────────

/// Directory where certificate PEM files are materialized for the proxy.
pub const DEFAULT_SSL_DIRECTORY: &str = "/etc/ingress-controller/ssl";

/// Filename of the generated fallback certificate inside `DEFAULT_SSL_DIRECTORY`.
pub const FAKE_CERTIFICATE_FILENAME: &str = "default-fake-certificate.pem";

// ─── Config ───────────────────────────────────────────────────────────────

/// Default controller config file path.
pub const DEFAULT_CONTROLLER_CONFIG: &str = "/etc/ingress-sync/config.yaml";
