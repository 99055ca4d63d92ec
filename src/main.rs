use clap::Parser;
use rsync_generations::backup::backup_config::BackupConfigLayer;
use rsync_generations::backup::orchestrator::Orchestrator;
use rsync_generations::backup::result_error::result::Result;
use rsync_generations::backup::sync::rsync::RsyncSynchronizer;
use std::path::PathBuf;
use std::process::exit;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Create incremental backups with RSYNC
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML file with settings, overridden by the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Source directory
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Destination directory
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Number of backup generations
    #[arg(short = 'c', long = "count")]
    retention_count: Option<u32>,

    /// Dry run
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Digits in the generation suffix
    #[arg(long)]
    name_width: Option<u8>,

    /// Sync executable to use instead of rsync from PATH
    #[arg(long)]
    sync_binary: Option<PathBuf>,
}

impl From<Args> for BackupConfigLayer {
    fn from(args: Args) -> Self {
        BackupConfigLayer {
            source: args.source,
            destination: args.destination,
            retention_count: args.retention_count,
            dry_run: args.dry_run.then_some(true),
            name_width: args.name_width,
            sync_binary: args.sync_binary,
        }
    }
}

fn run(args: Args) -> Result<()> {
    let file_layer = match &args.config {
        Some(path) => BackupConfigLayer::from_yaml_file(path)?,
        None => BackupConfigLayer::default(),
    };
    let config = file_layer.merge(args.into()).into_config()?;

    let rsync = RsyncSynchronizer::locate(config.sync_binary().as_deref())?;
    Orchestrator::new(&config, &rsync).run().map(|_| ())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("{e}");
        exit(e.exit_code());
    }
}
