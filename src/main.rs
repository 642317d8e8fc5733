//! xpinstall - Xposed framework installer.
//!
//! Installs the framework by staging a flashable zip for the recovery:
//! - compatibility probe for legacy (SDK <= 19) devices
//! - payload copied to the recovery directory with a command file
//! - optional reboot into recovery to apply it

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xpinstall::commands::{self, Context, FlashKind, ShowTarget};
use xpinstall::config::Config;
use xpinstall::flash::RebootAction;

/// Blocking workers: one privileged sequence, one confirmation thread, and
/// manifest/disk I/O.
const MAX_BLOCKING_THREADS: usize = 4;

#[derive(Parser)]
#[command(name = "xpinstall")]
#[command(about = "Xposed framework installer")]
#[command(
    after_help = "QUICK START:\n  xpinstall preflight            Check root, assets and compatibility\n  xpinstall install <zip>        Stage a framework zip for the recovery\n  xpinstall mode 1               Flash automatically in recovery\n  xpinstall reboot-recovery      Reboot into recovery"
)]
struct Cli {
    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show device and installed framework state
    Status,

    /// Run preflight checks (root, assets, compatibility)
    Preflight {
        /// Exit with an error if any check fails
        #[arg(long)]
        strict: bool,
    },

    /// Run the compatibility probe
    Probe,

    /// Stage a framework installer zip for the recovery
    Install {
        /// Path to the flashable zip
        payload: PathBuf,
    },

    /// Stage a framework uninstaller zip for the recovery
    Uninstall {
        /// Path to the flashable zip
        payload: PathBuf,
    },

    /// Reboot the device
    Reboot,

    /// Reboot into recovery
    RebootRecovery,

    /// Restart the UI and zygote without a full reboot
    SoftReboot,

    /// Show or set the install mode (0 normal, 1 recovery auto, 2 recovery manual)
    Mode {
        value: Option<i64>,
    },

    /// Change a setting (install-mode, confirm-reboots, hide-install-warning)
    Set {
        key: String,
        value: String,
    },

    /// Enable or disable the installed framework for the next boot
    Toggle,

    /// List installer/uninstaller packages a manifest offers for this device
    Packages {
        /// Manifest JSON file
        manifest: PathBuf,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowWhat,
    },
}

#[derive(Subcommand)]
enum ShowWhat {
    /// Show current configuration
    Config,
    /// Show persisted settings
    Settings,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("XPINSTALL_LOG")
        .unwrap_or_else(|_| EnvFilter::new("xpinstall=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present, before anything reads the environment
    dotenvy::dotenv().ok();
    init_logging();

    let base_dir = std::env::current_dir()?;
    let config = Config::load(&base_dir);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .max_blocking_threads(MAX_BLOCKING_THREADS)
        .enable_all()
        .build()?;

    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let yes = cli.yes;
    match cli.command {
        Commands::Status => commands::cmd_status(&Context::detect(config)?)?,
        Commands::Preflight { strict } => {
            commands::cmd_preflight(&Context::detect(config)?, strict).await?
        }
        Commands::Probe => commands::cmd_probe(&Context::detect(config)?).await?,
        Commands::Install { payload } => {
            let ctx = Context::detect(config)?;
            commands::cmd_flash(&ctx, FlashKind::Install, payload, yes).await?
        }
        Commands::Uninstall { payload } => {
            let ctx = Context::detect(config)?;
            commands::cmd_flash(&ctx, FlashKind::Uninstall, payload, yes).await?
        }
        Commands::Reboot => {
            let ctx = Context::detect(config)?;
            commands::cmd_reboot(&ctx, RebootAction::Reboot, yes).await?
        }
        Commands::RebootRecovery => {
            let ctx = Context::detect(config)?;
            commands::cmd_reboot(&ctx, RebootAction::recovery(), yes).await?
        }
        Commands::SoftReboot => {
            let ctx = Context::detect(config)?;
            commands::cmd_reboot(&ctx, RebootAction::SoftRestart, yes).await?
        }
        Commands::Mode { value } => commands::cmd_mode(&config, value)?,
        Commands::Set { key, value } => commands::cmd_set(&config, &key, &value)?,
        Commands::Toggle => commands::cmd_toggle(&config)?,
        Commands::Packages { manifest } => {
            let ctx = Context::detect(config)?;
            commands::cmd_packages(&ctx, &manifest).await?
        }
        Commands::Show { what } => {
            let target = match what {
                ShowWhat::Config => ShowTarget::Config,
                ShowWhat::Settings => ShowTarget::Settings,
            };
            commands::cmd_show(target, &config)?;
        }
    }
    Ok(())
}
