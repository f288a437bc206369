//! gitglow - GitHub activity on an LED matrix.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use gitglow::Settings;
use gitglow::app::{self, RunOptions};

/// GitHub contribution and pull-request display appliance
#[derive(Parser, Debug)]
#[command(name = "gitglow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/gitglow/config.toml)
    #[arg(short, long, env = "GITGLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Start in setup mode even if the device is configured
    #[arg(long)]
    setup: bool,

    /// Listen address for the web interface (overrides the configured port)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn main() {
    let cli = Cli::parse();
    let opts = RunOptions {
        config_path: cli.config,
        force_setup: cli.setup,
        bind: cli.bind,
    };

    // Logging needs the level before the runtime starts.
    let mut settings = Settings::load_or_default(&opts.config_path());
    settings.apply_env();
    let guard = match gitglow::logging::init(&settings.log_level, settings.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to start async runtime");
            process::exit(2);
        }
    };

    let code = match runtime.block_on(app::run(opts)) {
        Ok(reason) => reason.exit_code(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "startup failed");
            2
        }
    };
    drop(runtime);
    drop(guard);
    process::exit(code);
}
