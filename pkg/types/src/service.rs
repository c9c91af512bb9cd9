use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
    ExternalName,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceType::ClusterIP => write!(f, "ClusterIP"),
            ServiceType::NodePort => write!(f, "NodePort"),
            ServiceType::LoadBalancer => write!(f, "LoadBalancer"),
            ServiceType::ExternalName => write!(f, "ExternalName"),
        }
    }
}

/// Transport protocol of a service or endpoint port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
            Protocol::Sctp => write!(f, "SCTP"),
        }
    }
}

/// A port reference that is either a number or a named port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i32),
    String(String),
}

impl IntOrString {
    /// Numeric value, parsing a string form if it holds a number.
    /// Returns 0 when no number can be obtained.
    pub fn int_value(&self) -> i32 {
        match self {
            IntOrString::Int(n) => *n,
            IntOrString::String(s) => s.parse().unwrap_or(0),
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, IntOrString::Int(_))
    }

    /// Parse a textual port: numbers become `Int`, anything else `String`.
    pub fn parse(value: &str) -> Self {
        match value.parse::<i32>() {
            Ok(n) => IntOrString::Int(n),
            Err(_) => IntOrString::String(value.to_string()),
        }
    }
}

impl Default for IntOrString {
    fn default() -> Self {
        IntOrString::Int(0)
    }
}

impl fmt::Display for IntOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrString::Int(n) => write!(f, "{}", n),
            IntOrString::String(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePort {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protocol: Protocol,
    pub port: i32,
    /// Unset means "same as `port`".
    #[serde(default)]
    pub target_port: Option<IntOrString>,
    #[serde(default)]
    pub node_port: Option<u16>,
}

impl ServicePort {
    /// The port traffic is delivered to on the endpoints.
    pub fn effective_target_port(&self) -> IntOrString {
        self.target_port
            .clone()
            .unwrap_or(IntOrString::Int(self.port))
    }
}

impl fmt::Display for ServicePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{name={} port={}/{} targetPort={}}}",
            self.name,
            self.port,
            self.protocol,
            self.effective_target_port()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
    #[serde(default)]
    pub service_type: ServiceType,
    /// DNS name targeted by an `ExternalName` service.
    #[serde(default)]
    pub external_name: Option<String>,
    /// e.g. `PreferClose`.
    #[serde(default)]
    pub traffic_distribution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub spec: ServiceSpec,
    #[serde(default)]
    pub cluster_ip: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Service {
    /// Store key in `namespace/name` form.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_or_string_parsing() {
        assert_eq!(IntOrString::parse("80"), IntOrString::Int(80));
        assert_eq!(
            IntOrString::parse("http"),
            IntOrString::String("http".to_string())
        );
        assert_eq!(IntOrString::String("8080".to_string()).int_value(), 8080);
        assert_eq!(IntOrString::String("web".to_string()).int_value(), 0);
    }

    #[test]
    fn int_or_string_deserializes_untagged() {
        let n: IntOrString = serde_json::from_str("443").unwrap();
        let s: IntOrString = serde_json::from_str("\"https\"").unwrap();
        assert_eq!(n, IntOrString::Int(443));
        assert_eq!(s, IntOrString::String("https".to_string()));
    }

    #[test]
    fn target_port_defaults_to_port() {
        let sp = ServicePort {
            name: "http".to_string(),
            port: 80,
            ..Default::default()
        };
        assert_eq!(sp.effective_target_port(), IntOrString::Int(80));
    }
}
