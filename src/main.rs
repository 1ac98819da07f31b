use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use uf2d::adapters::{self, FsAdapter, MountAdapter};
use uf2d::config::{self, WatchConfig};
use uf2d::core::Poller;
use uf2d::logging::{self, LogConfig};

#[derive(Parser)]
#[command(name = "uf2d")]
#[command(about = "Uploads a UF2 firmware image when the bootloader drive appears", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch for the drive and upload whenever it appears
    Watch(WatchArgs),
    /// Probe the drive once and upload once
    Upload(UploadArgs),
}

#[derive(Args)]
struct WatchArgs {
    /// Mount root the bootloader exposes (e.g. /media/user/RPI-RP2)
    mount: PathBuf,

    /// Firmware image to copy
    #[arg(long, default_value = config::DEFAULT_FIRMWARE_PATH)]
    firmware: PathBuf,

    /// Presence check interval in milliseconds
    #[arg(long, default_value_t = 200)]
    poll_ms: u64,

    /// Suppression window after a detection, in milliseconds
    #[arg(long, default_value_t = 5000)]
    cooldown_ms: u64,

    /// Re-check delay after a failed upload, in milliseconds
    #[arg(long, default_value_t = 2000)]
    retry_ms: u64,

    /// Use the in-memory mount, driven by 'insert'/'rm'/'fail <n>' on stdin
    #[arg(long)]
    simulation: bool,
}

#[derive(Args)]
struct UploadArgs {
    /// Mount root the bootloader exposes
    mount: PathBuf,

    /// Firmware image to copy
    #[arg(long, default_value = config::DEFAULT_FIRMWARE_PATH)]
    firmware: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(LogConfig {
        json: cli.json,
        verbose: cli.verbose,
    });

    match cli.command {
        Commands::Watch(args) => run_watch(args).await.context("watch failed")?,
        Commands::Upload(args) => run_upload(args).await.context("upload failed")?,
    }

    Ok(())
}

async fn run_watch(args: WatchArgs) -> Result<()> {
    let config = WatchConfig {
        mount_path: args.mount,
        firmware_path: args.firmware,
        poll_interval: Duration::from_millis(args.poll_ms),
        cooldown: Duration::from_millis(args.cooldown_ms),
        retry_delay: Duration::from_millis(args.retry_ms),
    };

    let adapter = adapters::get_adapter(args.simulation, &config);
    let cancel = CancellationToken::new();

    let watcher = tokio::spawn(Poller::new(config, adapter).run(cancel.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    cancel.cancel();
    watcher.await.context("watch loop panicked")?;

    Ok(())
}

async fn run_upload(args: UploadArgs) -> Result<()> {
    let adapter = FsAdapter::new(args.mount.clone());

    if !adapter.is_present().await {
        anyhow::bail!("drive {} is not present", args.mount.display());
    }

    let report = adapter.upload(&args.firmware).await?;
    println!(
        "Uploaded {} bytes at {}",
        report.bytes,
        report.at.format("%H:%M:%S")
    );

    Ok(())
}
