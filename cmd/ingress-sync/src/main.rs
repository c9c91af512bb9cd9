mod sync;

use anyhow::Context;
use clap::Parser;
use pkg_constants::paths::DEFAULT_CONTROLLER_CONFIG;
use pkg_ingress::Config;
use pkg_pki::FakeCertificate;
use pkg_types::config::{ControllerConfigFile, load_config_file};
use pkg_types::validate::parse_name_ns;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::sync::SyncLoop;

#[derive(Parser, Debug)]
#[command(
    name = "ingress-sync",
    about = "Synthesize ingress proxy configuration from cluster state"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_CONTROLLER_CONFIG)]
    config: String,

    /// Store snapshot (YAML or JSON) to synthesize from
    #[arg(long, short)]
    snapshot: String,

    /// Write the configuration to this file instead of stdout
    #[arg(long, short)]
    output: Option<String>,

    /// Re-read the snapshot and re-synthesize every N seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    log_json: bool,

    /// Service backing the default upstream (namespace/name)
    #[arg(long)]
    default_service: Option<String>,

    /// Zone this controller runs in
    #[arg(long)]
    zone: Option<String>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Load config file (returns defaults if file not found)
    let file_cfg: ControllerConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);

    // Merge: CLI args > config file > defaults
    let mut config = Config::from_file(&file_cfg);
    if cli.default_service.is_some() {
        config.default_service = cli.default_service;
    }
    if cli.zone.is_some() {
        config.zone = cli.zone;
    }

    for key in [
        &config.default_service,
        &config.tcp_config_map_name,
        &config.udp_config_map_name,
        &config.default_ssl_certificate,
    ]
    .into_iter()
    .flatten()
    {
        parse_name_ns(key).with_context(|| format!("Invalid reference in {}", cli.config))?;
    }

    let fake = FakeCertificate::generate().context("Failed to generate default certificate")?;
    config.fake_certificate = Some(fake.ssl_cert().clone());

    info!("Starting ingress-sync");
    info!("  Snapshot:        {}", cli.snapshot);
    info!(
        "  Default service: {}",
        config.default_service.as_deref().unwrap_or("<none>")
    );
    info!("  Zone:            {}", config.zone.as_deref().unwrap_or("<none>"));

    let sync = SyncLoop::new(config, cli.snapshot, cli.output);
    match cli.interval {
        Some(secs) => sync.run(Duration::from_secs(secs.max(1))).await,
        None => sync.sync_once(None).map(|_| ()),
    }
}
