use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use depdiff::config::DepdiffConfig;
use depdiff::orchestrator::DependencyDiffPipeline;

#[derive(Parser)]
#[command(name = "depdiff")]
#[command(
    version,
    about = "Show the source code changes behind dependency version bumps"
)]
struct Cli {
    /// Unified diff of a requirements file; read from stdin when omitted or "-"
    file: Option<PathBuf>,

    /// Maximum number of packages retrieved concurrently
    #[arg(long)]
    workers: Option<usize>,

    /// Per-package timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Base URL of the package registry
    #[arg(long, value_name = "URL")]
    registry_url: Option<String>,

    /// Compare release artifacts without trying the repository first
    #[arg(long)]
    no_vcs: bool,

    /// Download old and new releases one after the other
    #[arg(long)]
    sequential_downloads: bool,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter directive (e.g. "debug", "depdiff=trace")
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Write JSON logs to the data directory instead of stderr
    #[arg(long)]
    log_file: bool,
}

impl Cli {
    /// File values first, then command-line overrides
    fn load_config(&self) -> anyhow::Result<DepdiffConfig> {
        let mut config = match &self.config {
            Some(path) => DepdiffConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => DepdiffConfig::default(),
        };

        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.task_timeout_secs = timeout;
        }
        if let Some(url) = &self.registry_url {
            config.registry_url = url.clone();
        }
        if self.no_vcs {
            config.vcs.enabled = false;
        }
        if self.sequential_downloads {
            config.artifacts.parallel_downloads = false;
        }
        Ok(config)
    }
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

async fn run(input: String, config: DepdiffConfig) {
    debug!("Using configuration {:?}", config);
    let pipeline = DependencyDiffPipeline::from_config(&config);
    let report = pipeline.process_requirements_diff(&input).await;
    pipeline.cleanup().await;
    println!("{report}");
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = depdiff::logging::init(cli.log_level.as_deref(), cli.log_file)?;
    let config = cli.load_config()?;

    let input = read_input(cli.file.as_deref())?;
    if input.trim().is_empty() {
        eprintln!("No input provided. Pass a requirements diff as a file or on stdin.");
        return Ok(());
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(input, config));
    Ok(())
}
