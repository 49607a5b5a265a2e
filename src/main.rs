use anyhow::Result;
use clap::Parser;
use rawcam::{MockCameraProvider, RawcamApp, RawcamConfig, RunOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "rawcam")]
#[command(about = "Manual camera capture-control pipeline with live frame analysis")]
#[command(version)]
#[command(long_about = "Drives a camera session from a live parameter store: manual exposure, \
focus and white balance, tap-to-focus triggers, still capture to JPEG or DNG, and histogram, \
zebra and focus peaking analysis of the preview stream. Without real hardware the simulated \
camera backend and a synthetic frame source are used.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "rawcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without opening a camera")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write daily-rotated log files into this directory
    #[arg(long, value_name = "DIR", help = "Directory for rotated log files")]
    log_dir: Option<String>,

    /// Stop after this many synthetic frames
    #[arg(long, value_name = "N", help = "Number of preview frames to run before exiting")]
    frames: Option<u64>,

    /// Take one still when the frame budget runs out
    #[arg(long, help = "Capture a still image at the end of the frame budget")]
    capture: bool,

    /// Synthetic frame interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 33, help = "Synthetic frame interval")]
    frame_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let log_guard = init_logging(&args)?;

    info!("Starting rawcam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match RawcamConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let options = RunOptions {
        frames: args.frames,
        capture: args.capture,
        frame_interval: Duration::from_millis(args.frame_interval_ms.max(1)),
        ..RunOptions::default()
    };

    let provider = Arc::new(MockCameraProvider::with_default_cameras());
    let mut app = RawcamApp::new(config, provider, options).await.map_err(|e| {
        error!("Failed to create application: {}", e);
        e
    })?;

    app.initialize().await.map_err(|e| {
        error!("Failed to initialize components: {}", e);
        e
    })?;

    app.start().await.map_err(|e| {
        error!("Failed to start components: {}", e);
        e
    })?;

    let exit_code = app.run().await.map_err(|e| {
        error!("Runtime error: {}", e);
        e
    })?;

    info!("rawcam exited with code: {}", exit_code);
    drop(log_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rawcam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match args.log_dir.as_deref() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "rawcam.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# rawcam configuration file");
    println!("# Every option is shown with its default value");
    println!();
    println!("{}", toml::to_string_pretty(&RawcamConfig::default())?);
    Ok(())
}
