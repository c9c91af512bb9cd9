use anyhow::Context;
use pkg_ingress::{Config, Synthesizer};
use pkg_state::SnapshotStore;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Re-synthesizes the proxy configuration from a store snapshot.
pub struct SyncLoop {
    config: Config,
    snapshot_path: String,
    output: Option<String>,
}

impl SyncLoop {
    pub fn new(config: Config, snapshot_path: String, output: Option<String>) -> Self {
        Self {
            config,
            snapshot_path,
            output,
        }
    }

    /// Run the synthesis loop; configurations are only written when their
    /// checksum changes.
    pub async fn run(self, check_interval: Duration) -> anyhow::Result<()> {
        info!("Sync loop started (interval={}s)", check_interval.as_secs());
        let mut interval = tokio::time::interval(check_interval);
        let mut last_checksum: Option<String> = None;

        loop {
            interval.tick().await;
            match self.sync_once(last_checksum.as_deref()) {
                Ok(Some(checksum)) => last_checksum = Some(checksum),
                Ok(None) => debug!("Configuration unchanged"),
                Err(e) => warn!("Sync failed: {:#}", e),
            }
        }
    }

    /// One synthesis pass. Returns the new checksum when a configuration
    /// was written, `None` when it matched `last_checksum`.
    pub fn sync_once(&self, last_checksum: Option<&str>) -> anyhow::Result<Option<String>> {
        let store = SnapshotStore::load(&self.snapshot_path)?;
        let ingresses = store.ingresses().to_vec();
        let synthesizer = Synthesizer::new(self.config.clone(), store);
        let synthesis = synthesizer.build_configuration(&ingresses);

        let checksum = synthesis.configuration.configuration_checksum.clone();
        if last_checksum == Some(checksum.as_str()) {
            return Ok(None);
        }

        let mut json = serde_json::to_string_pretty(&synthesis.configuration)?;
        json.push('\n');
        match &self.output {
            Some(path) => std::fs::write(path, json)
                .with_context(|| format!("Failed to write configuration to {}", path))?,
            None => std::io::stdout().lock().write_all(json.as_bytes())?,
        }

        info!(
            "Configuration {} written for {} hosts",
            checksum,
            synthesis.hosts.len()
        );
        debug!(
            "Hosts: {}",
            synthesis.hosts.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        Ok(Some(checksum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
services:
  - name: web
    namespace: default
    spec:
      ports:
        - name: http
          port: 80
endpoint-slices:
  - name: web-1
    namespace: default
    service_name: web
    endpoints:
      - addresses: ["10.0.0.1"]
    ports:
      - name: http
        port: 80
ingresses:
  - name: web
    namespace: default
    spec:
      rules:
        - host: web.example.com
          http:
            paths:
              - path: /
                path_type: Prefix
                backend:
                  service: { name: web, port: { number: 80 } }
"#;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("ingress-sync-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn unchanged_configuration_is_not_rewritten() {
        let dir = scratch_dir("unchanged");
        let snapshot = dir.join("snapshot.yaml");
        let output = dir.join("config.json");
        std::fs::write(&snapshot, SNAPSHOT).unwrap();

        let sync = SyncLoop::new(
            Config::default(),
            snapshot.to_string_lossy().into_owned(),
            Some(output.to_string_lossy().into_owned()),
        );

        let first = sync.sync_once(None).unwrap().unwrap();
        assert_eq!(first.len(), 64);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["configuration_checksum"], first.as_str());

        std::fs::remove_file(&output).unwrap();
        assert!(sync.sync_once(Some(&first)).unwrap().is_none());
        assert!(!output.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = scratch_dir("missing");
        let sync = SyncLoop::new(
            Config::default(),
            dir.join("absent.yaml").to_string_lossy().into_owned(),
            None,
        );
        assert!(sync.sync_once(None).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
