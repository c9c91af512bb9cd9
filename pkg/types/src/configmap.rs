use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigMap {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl ConfigMap {
    /// Store key in `namespace/name` form.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
