//! Sidewave headless runner
//!
//! Starts one sidebar instance against an in-memory browser, replays the
//! host events of a fixture and prints the resulting state as JSON.
//!
//! ```text
//! sidewave [--fixture session.json] [--config sidewave.json]
//!          [--settle-ms 100] [--output state.json] [--verbose] [--json-logs]
//! ```

mod fixture;
mod snapshot;
mod store;

use fixture::Fixture;
use sidewave_common::{init_logging, LogConfig, LogFormat};
use sidewave_core::SidebarConfig;
use sidewave_sync::{SidebarHost, SidebarInstance};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use store::StoreActions;
use tracing::{error, info};

/// Parse command line arguments
struct Args {
    fixture: Option<String>,
    config: Option<String>,
    settle_ms: u64,
    output: Option<String>,
    verbose: bool,
    json_logs: bool,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut fixture = None;
        let mut config = None;
        let mut settle_ms = 100u64;
        let mut output = None;
        let mut verbose = false;
        let mut json_logs = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--fixture" => {
                    fixture = args.next();
                }
                "--config" => {
                    config = args.next();
                }
                "--settle-ms" => {
                    if let Some(val) = args.next() {
                        settle_ms = val.parse().unwrap_or(100);
                    }
                }
                "--output" => {
                    output = args.next();
                }
                "--verbose" | "-v" => {
                    verbose = true;
                }
                "--json-logs" => {
                    json_logs = true;
                }
                _ => {}
            }
        }

        Self {
            fixture,
            config,
            settle_ms,
            output,
            verbose,
            json_logs,
        }
    }

    fn log_config(&self, config: &SidebarConfig) -> LogConfig {
        let mut log_config = if self.verbose {
            LogConfig::debug()
        } else {
            LogConfig::default()
        };
        if self.json_logs {
            log_config.format = LogFormat::Json;
        }
        if let Some(filter) = &config.log_filter {
            log_config = log_config.with_filter(filter.clone());
        }
        log_config
    }
}

async fn run(args: Args, config: SidebarConfig) -> anyhow::Result<()> {
    let fixture = match &args.fixture {
        Some(path) => Fixture::load(Path::new(path))?,
        None => Fixture::default(),
    };

    let host = Arc::new(fixture.build_host());
    let actions = Arc::new(StoreActions::new(host.clone()));
    let instance =
        SidebarInstance::start(SidebarHost::from_shared(host.clone()), actions, config).await?;

    fixture.replay(&host);
    tokio::time::sleep(Duration::from_millis(args.settle_ms)).await;

    let state = snapshot::render(&instance.state().snapshot(), instance.report());
    let rendered = serde_json::to_string_pretty(&state)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!("State written to {}", path);
        }
        None => println!("{}", rendered),
    }

    instance.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() {
    // Route `log` records (from sidewave-core) into tracing
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to set log tracer: {}", e);
    }

    let args = Args::parse();
    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(SidebarConfig::default_path);
    let config = SidebarConfig::load(&config_path);
    init_logging(args.log_config(&config));

    info!("Starting Sidewave sidebar ({})", config.instance_type);

    if let Err(e) = run(args, config).await {
        error!("Sidebar run failed: {:#}", e);
        std::process::exit(1);
    }
}
