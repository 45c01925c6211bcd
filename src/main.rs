//! codescan-init - prepares a code scanning run.
//!
//! Entry point of the action's init step.
//!
//! # Execution Flow
//!
//! 1. Read [`ActionSettings`] from the environment
//! 2. Initialize logging → stderr and `<RUNNER_TEMP>/logs/codescan-init.log`
//! 3. Create a single-threaded tokio runtime
//! 4. Resolve and persist the configuration ([`ConfigLoader::init_config`])
//! 5. Print the `--ram` and `--threads` flags for later steps
//!
//! # Output
//!
//! Written to stdout, one per line:
//! - `ram-flag=--ram=<megabytes>`
//! - `threads-flag=--threads=<count>`

use anyhow::{Context, Result};
use codescan_action::services::{get_memory_flag, get_threads_flag};
use codescan_action::{APP_NAME, ActionSettings, CodeQlCli, ConfigLoader, GitHubClient, VERSION};

/// Main entry point for the init step
///
/// # Errors
///
/// This function can fail if:
/// - Required runner variables are missing or malformed
/// - The configuration file or a query reference is invalid
/// - The analysis tool or the source-hosting API cannot be reached
/// - The RAM or threads input is invalid
fn main() -> Result<()> {
    let settings = ActionSettings::from_env().context("Failed to read action settings")?;

    let log_dir = settings.temp_dir.join("logs");
    let _guard = codescan_action::logging::setup_logging(Some(log_dir.as_path()), "codescan-init", settings.debug)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if settings.local_run {
        tracing::info!("Running in local-run mode (job: {})", settings.job);
    }

    // Every step awaits the previous one; one thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let tool = CodeQlCli::new(settings.tool_path.clone(), settings.extra_options.clone());
    let host = GitHubClient::new(&settings.api_url, &settings.token)
        .context("Failed to create source-hosting client")?;
    let loader = ConfigLoader::new(&tool, &host);

    let config = runtime
        .block_on(loader.init_config(&settings.init_inputs()))
        .context("Failed to initialize configuration")?;

    tracing::info!(
        "Configuration ready: languages={:?}, queries={}",
        config.languages,
        config.queries.values().map(Vec::len).sum::<usize>()
    );

    let ram_flag = get_memory_flag(&settings)?;
    let threads_flag = get_threads_flag(&settings)?;
    println!("ram-flag={}", ram_flag);
    println!("threads-flag={}", threads_flag);

    Ok(())
}
