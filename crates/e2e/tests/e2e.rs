//! Verification harness entry point
//!
//! This file is the test binary that runs the built-in flows against a
//! storefront instance that is already listening.
//! Run with: cargo test --package storefront-e2e --test e2e -- [flags]

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use storefront_e2e::playwright::{Browser, PlaywrightConfig};
use storefront_e2e::runner::RunnerConfig;
use storefront_e2e::server::ProbeConfig;
use storefront_e2e::{E2eResult, VerifyRunner};

#[derive(Parser, Debug)]
#[command(name = "storefront-e2e")]
#[command(about = "Browser verification runner for the storefront")]
struct Args {
    /// Base URL of the running storefront
    #[arg(long, default_value = "http://localhost:3000")]
    base_url: String,

    /// Run only the named flow (buy-now, chat, top-bar)
    #[arg(short, long)]
    flow: Option<String>,

    /// Directory screenshots are written into
    #[arg(short, long, default_value = "jules-scratch/verification")]
    output: PathBuf,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run in headless mode
    #[arg(long, default_value = "true")]
    headless: bool,

    /// Default per-step timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    navigation_timeout_ms: u64,

    /// Readiness probe deadline in seconds
    #[arg(long, default_value = "30")]
    probe_deadline_secs: u64,

    /// Skip the readiness probe
    #[arg(long)]
    skip_probe: bool,

    /// Treat navigation failures as fatal for the exit code
    #[arg(long)]
    strict: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    // Run async main
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<i32> {
    let browser = match args.browser.as_str() {
        "firefox" => Browser::Firefox,
        "webkit" => Browser::Webkit,
        _ => Browser::Chromium,
    };

    let config = RunnerConfig {
        playwright: PlaywrightConfig {
            base_url: args.base_url,
            output_dir: args.output.clone(),
            browser,
            headless: args.headless,
            default_timeout_ms: args.timeout_ms,
            navigation_timeout_ms: args.navigation_timeout_ms,
        },
        probe: ProbeConfig {
            deadline: Duration::from_secs(args.probe_deadline_secs),
            ..Default::default()
        },
        results_path: args.output.join("verify-results.json"),
        skip_probe: args.skip_probe,
    };

    let runner = VerifyRunner::with_config(config);

    let suite = match args.flow {
        Some(name) => runner.run_named(&name).await?,
        None => runner.run_all().await?,
    };

    runner.write_results(&suite)?;

    Ok(suite.exit_code(args.strict))
}
