use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotations::IngressAnnotations;
use crate::service::IntOrString;

/// Path matching type for Ingress rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathType {
    #[default]
    Prefix,
    Exact,
    ImplementationSpecific,
}

/// Port of a backend service, referenced by name or by number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBackendPort {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: i32,
}

impl ServiceBackendPort {
    pub fn number(number: i32) -> Self {
        Self {
            name: String::new(),
            number,
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            number: 0,
        }
    }

    /// Textual form used for upstream names and port matching:
    /// the name when set, else the number.
    pub fn as_key(&self) -> String {
        if self.name.is_empty() {
            self.number.to_string()
        } else {
            self.name.clone()
        }
    }

    pub fn to_int_or_string(&self) -> IntOrString {
        if self.name.is_empty() {
            IntOrString::Int(self.number)
        } else {
            IntOrString::String(self.name.clone())
        }
    }
}

/// Backend service target for an Ingress path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressServiceBackend {
    pub name: String,
    pub port: ServiceBackendPort,
}

/// Reference to a non-service backend (e.g. a storage bucket).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedLocalObjectReference {
    #[serde(default)]
    pub api_group: Option<String>,
    pub kind: String,
    pub name: String,
}

/// Either a service backend or a resource backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressBackend {
    #[serde(default)]
    pub service: Option<IngressServiceBackend>,
    #[serde(default)]
    pub resource: Option<TypedLocalObjectReference>,
}

impl IngressBackend {
    pub fn service(name: &str, port: ServiceBackendPort) -> Self {
        Self {
            service: Some(IngressServiceBackend {
                name: name.to_string(),
                port,
            }),
            resource: None,
        }
    }
}

/// A single path rule within an Ingress HTTP rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressPath {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub path_type: PathType,
    pub backend: IngressBackend,
}

/// HTTP rules for a host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressHTTP {
    #[serde(default)]
    pub paths: Vec<IngressPath>,
}

/// A single host-based Ingress rule. An empty host matches every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub http: Option<IngressHTTP>,
}

/// TLS configuration for an Ingress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressTLS {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub secret_name: String,
}

/// Ingress specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressSpec {
    #[serde(default)]
    pub default_backend: Option<IngressBackend>,
    #[serde(default)]
    pub rules: Vec<IngressRule>,
    #[serde(default)]
    pub tls: Vec<IngressTLS>,
}

/// Ingress resource for external traffic routing, together with its
/// pre-parsed annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingress {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub spec: IngressSpec,
    #[serde(default)]
    pub parsed_annotations: IngressAnnotations,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Ingress {
    /// Store key in `namespace/name` form.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
