//! Verification harness entry point
//!
//! Runs one scripted pass against a live map application:
//! `mapstyle-verify [URL]`, defaulting to the local dev server.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mapstyle_verify::{Runner, RunnerConfig, Variant};

#[derive(Parser, Debug)]
#[command(name = "mapstyle-verify")]
#[command(about = "Visual verification of the map style switcher")]
struct Args {
    /// Target application URL
    #[arg(default_value = "http://localhost:3000")]
    url: String,

    /// UI structure variant to drive (dropdown, switcher)
    #[arg(long, default_value = "dropdown")]
    variant: String,

    /// Directory for screenshots and the run summary
    #[arg(long, default_value = "verification")]
    out: PathBuf,

    /// Budget for the map canvas to become visible, in seconds
    #[arg(long, default_value = "20")]
    canvas_timeout_secs: u64,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Skip the HTTP reachability probe before launching the browser
    #[arg(long)]
    no_preflight: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("info".parse().expect("valid directive")),
        )
        .init();

    let args = Args::parse();

    let variant = match args.variant.as_str() {
        "dropdown" => Variant::Dropdown,
        "switcher" => Variant::Switcher,
        other => {
            eprintln!("unknown variant '{other}' (expected 'dropdown' or 'switcher')");
            std::process::exit(2);
        }
    };

    let config = RunnerConfig {
        target_url: args.url,
        variant,
        artifact_dir: args.out,
        headless: !args.headed,
        preflight: !args.no_preflight,
        canvas_timeout: Duration::from_secs(args.canvas_timeout_secs),
    };

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    match rt.block_on(Runner::new(config).run()) {
        Ok(summary) => {
            info!(
                "verification passed: {} screenshot(s) in {} ms",
                summary.artifacts.len(),
                summary.duration_ms
            );
            std::process::exit(0);
        }
        Err(e) if e.is_script_failure() => {
            error!("verification failed: {e}");
            std::process::exit(1);
        }
        Err(e) => {
            error!("harness error: {e}");
            std::process::exit(2);
        }
    }
}
