use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use wipeme::ui::{human_bytes, ProgressRenderer, RenderMode};
use wipeme::*;

#[derive(Parser)]
#[command(name = "wipeme")]
#[command(about = "Overwrite the free space of a volume without ever filling it up")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available wipe methods
    Methods,

    /// Show free space and the wipe plan for a volume
    Info {
        /// Volume root (any directory on the volume)
        volume: PathBuf,
    },

    /// Wipe the free space of a volume
    Wipe {
        /// Volume root (any directory on the volume)
        volume: PathBuf,

        /// Wipe method (zeros, dod, gutmann or 0, 1, 2)
        #[arg(short, long, default_value = "zeros")]
        method: WipeMethod,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Emit progress and the final report as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Remove a temporary directory left behind by an interrupted run
    Clean {
        /// Volume root (any directory on the volume)
        volume: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        let code = match e.downcast_ref::<WipeError>() {
            Some(WipeError::Interrupted) => 130,
            _ => 1,
        };
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if !cfg!(feature = "color-output") {
        colored::control::set_override(false);
    }

    let _log_guard = init_logging(cli.debug, cli.log_file.as_deref())?;
    let config = WipeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Methods => list_methods(),
        Commands::Info { volume } => show_info(&volume, config)?,
        Commands::Wipe {
            volume,
            method,
            yes,
            json,
        } => wipe_volume(&volume, method, config, yes, json).await?,
        Commands::Clean { volume } => clean_volume(&volume, config)?,
    }

    Ok(())
}

/// Console logging on stderr plus an optional plain-text log file.
///
/// `RUST_LOG` overrides the default level.
fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = match (debug, log_file.is_some()) {
        (true, _) => "wipeme=debug",
        (false, true) => "wipeme=info",
        (false, false) => "wipeme=warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(guard)
}

fn list_methods() {
    println!("{}", "Available wipe methods:".bold());
    for method in WipeMethod::ALL {
        println!(
            "  {}  {:<8} {} ({} pass{})",
            method.ordinal(),
            method.key().cyan(),
            method.name(),
            method.pass_count(),
            if method.pass_count() == 1 { "" } else { "es" }
        );
        println!("              {}", method.description().dimmed());
    }
}

fn show_info(volume: &Path, config: WipeConfig) -> Result<()> {
    let wiper = Wiper::new(volume, WipeMethod::SinglePassZeros)?.with_config(config);
    let info = wiper.volume_info()?;

    println!("{}", "Volume information:".bold());
    println!("  Path:          {}", volume.display());
    println!("  Total:         {}", human_bytes(info.total_bytes as f64));
    println!("  Used:          {}", human_bytes(info.used_bytes() as f64));
    println!(
        "  Free:          {} ({:.1}%)",
        human_bytes(info.free_bytes as f64),
        info.free_percentage()
    );

    match SafetyPlan::new(info.free_bytes, wiper.config()) {
        Ok(plan) => {
            println!("  Safety buffer: {}", human_bytes(plan.safety_buffer as f64));
            println!("  Phase 1 fill:  {}", human_bytes(plan.phase1_target as f64));
        }
        Err(e @ WipeError::InsufficientSpace { .. }) => {
            println!("  {} {}", "Cannot wipe:".yellow().bold(), e);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

async fn wipe_volume(
    volume: &Path,
    method: WipeMethod,
    config: WipeConfig,
    yes: bool,
    json: bool,
) -> Result<()> {
    if json && !yes {
        bail!("--json requires --yes");
    }

    let wiper = Wiper::new(volume, method)?.with_config(config);
    let plan = wiper.plan()?;

    if !json {
        println!("\n{}", "Free-space wipe".bold());
        println!("  Volume:        {}", volume.display());
        println!("  Method:        {}", method);
        println!("  Free space:    {}", human_bytes(plan.free_space as f64));
        println!("  Safety buffer: {}", human_bytes(plan.safety_buffer as f64));
        println!(
            "  Temp dir:      {}",
            wiper.temp_dir_path().display().to_string().dimmed()
        );
    }

    if !yes {
        println!(
            "\nThe volume will be filled to within {} of capacity, then briefly to capacity.",
            human_bytes(plan.safety_buffer as f64)
        );
        print!("Type 'WIPE' to confirm: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim() != "WIPE" {
            println!("Operation cancelled");
            return Ok(());
        }
    }

    setup_signal_handlers(wiper.cancel_flag())?;

    let mut handle = spawn_wipe(wiper);
    let mut renderer = ProgressRenderer::new(if json {
        RenderMode::Json
    } else {
        RenderMode::Bar
    });
    while let Some(progress) = handle.recv().await {
        renderer.update(&progress);
    }
    renderer.finish();

    let report = handle.join().await?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn clean_volume(volume: &Path, config: WipeConfig) -> Result<()> {
    let wiper = Wiper::new(volume, WipeMethod::SinglePassZeros)?.with_config(config);

    if wiper.clean_stale()? {
        println!("Removed {}", wiper.temp_dir_path().display());
    } else {
        println!("Nothing to clean on {}", volume.display());
    }
    Ok(())
}

fn print_report(report: &WipeReport) {
    // Millisecond precision is plenty for a run that takes minutes
    let duration = Duration::from_millis(report.duration.as_millis() as u64);

    println!("\n{}", "✅ Free-space wipe completed".green().bold());
    println!("  Session:       {}", report.session_id);
    println!("  Method:        {}", report.method);
    println!(
        "  Phase 1:       {} written (target {})",
        human_bytes(report.phase1_written as f64),
        human_bytes(report.phase1_target as f64)
    );
    println!(
        "  Reclaimed:     {} in {} file(s)",
        human_bytes(report.reclaimed_bytes as f64),
        report.reclaimed_files
    );
    println!(
        "  Phase 2:       {} written (target {})",
        human_bytes(report.phase2_written as f64),
        human_bytes(report.phase2_target as f64)
    );
    if report.storage_exhausted {
        println!("  {}", "Volume filled up before a pass target was reached".yellow());
    }
    println!("  Duration:      {}", humantime::format_duration(duration));
}

fn setup_signal_handlers(cancel: Arc<AtomicBool>) -> Result<()> {
    #[cfg(unix)]
    {
        use signal_hook::{
            consts::{SIGINT, SIGTERM},
            iterator::Signals,
        };

        let mut signals = Signals::new([SIGINT, SIGTERM])?;

        std::thread::spawn(move || {
            for _sig in signals.forever() {
                eprintln!("\n\n🛑 Interrupt received! Stopping wipe operation...");
                eprintln!("   Temporary files will be removed before exit.");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    #[cfg(not(unix))]
    {
        signal_hook::flag::register(signal_hook::consts::SIGINT, cancel)?;
    }

    Ok(())
}
