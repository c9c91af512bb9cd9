use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A TLS certificate materialized from a `kubernetes.io/tls` Secret.
///
/// PEM material is never serialized into the synthesized configuration;
/// only the file references and digests are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SSLCert {
    pub name: String,
    pub namespace: String,
    /// Path of the file holding certificate and key concatenated.
    #[serde(default)]
    pub pem_file_name: String,
    /// Digest of the PEM content, used to detect secret changes.
    #[serde(default)]
    pub pem_sha: String,
    #[serde(default)]
    pub ca_file_name: String,
    #[serde(default)]
    pub ca_sha: String,
    /// Common names and DNS SANs the certificate is valid for.
    #[serde(default)]
    pub cn: Vec<String>,
    #[serde(default)]
    pub expire_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub pem_cert_key: String,
    #[serde(default)]
    pub uid: String,
}

impl SSLCert {
    /// Store key in `namespace/name` form.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Whether one of the certificate names covers `host`,
    /// honouring a single leading `*.` wildcard label.
    pub fn matches_host(&self, host: &str) -> bool {
        self.cn.iter().any(|cn| host_matches(cn, host))
    }
}

/// Match `host` against `pattern`, where the pattern may be a `*.` wildcard
/// covering exactly one label.
pub fn host_matches(pattern: &str, host: &str) -> bool {
    if pattern.eq_ignore_ascii_case(host) {
        return true;
    }
    match pattern.strip_prefix("*.") {
        Some(suffix) => match host.split_once('.') {
            Some((label, rest)) => !label.is_empty() && rest.eq_ignore_ascii_case(suffix),
            None => false,
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_covers_one_label() {
        assert!(host_matches("*.example.com", "foo.example.com"));
        assert!(!host_matches("*.example.com", "a.b.example.com"));
        assert!(!host_matches("*.example.com", "example.com"));
        assert!(host_matches("Example.com", "example.com"));
    }

    #[test]
    fn certificate_matches_any_name() {
        let cert = SSLCert {
            name: "tls".to_string(),
            namespace: "default".to_string(),
            cn: vec!["example.com".to_string(), "*.example.org".to_string()],
            ..Default::default()
        };
        assert!(cert.matches_host("example.com"));
        assert!(cert.matches_host("www.example.org"));
        assert!(!cert.matches_host("example.net"));
    }
}
