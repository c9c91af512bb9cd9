use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::Protocol;

/// Reference to the object (usually a Pod) backing an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uid: String,
}

/// Readiness state of a slice endpoint. `None` means "unknown",
/// which consumers treat as ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConditions {
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub serving: Option<bool>,
    #[serde(default)]
    pub terminating: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForZone {
    pub name: String,
}

/// Topology hints attached to a slice endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHints {
    #[serde(default)]
    pub for_zones: Vec<ForZone>,
}

impl EndpointHints {
    pub fn has_zone(&self, zone: &str) -> bool {
        self.for_zones.iter().any(|z| z.name == zone)
    }
}

/// A single backend inside an EndpointSlice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceEndpoint {
    pub addresses: Vec<String>,
    #[serde(default)]
    pub conditions: EndpointConditions,
    #[serde(default)]
    pub hints: Option<EndpointHints>,
    #[serde(default)]
    pub target_ref: Option<ObjectReference>,
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
}

impl SliceEndpoint {
    pub fn is_ready(&self) -> bool {
        self.conditions.ready.unwrap_or(true)
    }

    /// True when at least one zone hint is present.
    pub fn has_zone_hints(&self) -> bool {
        self.hints
            .as_ref()
            .map(|h| !h.for_zones.is_empty())
            .unwrap_or(false)
    }

    pub fn hinted_for(&self, zone: &str) -> bool {
        self.hints.as_ref().map(|h| h.has_zone(zone)).unwrap_or(false)
    }
}

/// A port exposed by the endpoints of a slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPort {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<i32>,
    /// Unset means TCP.
    #[serde(default)]
    pub protocol: Option<Protocol>,
}

/// A batch of backend addresses for a Service.
/// Equivalent to a discovery.k8s.io/v1 EndpointSlice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointSlice {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub namespace: String,
    pub service_name: String,
    #[serde(default)]
    pub endpoints: Vec<SliceEndpoint>,
    #[serde(default)]
    pub ports: Vec<EndpointPort>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl EndpointSlice {
    /// Store key of the owning service, `namespace/service_name`.
    pub fn service_key(&self) -> String {
        format!("{}/{}", self.namespace, self.service_name)
    }
}
