pub mod client;
pub mod discovery;
pub mod models;
pub mod negotiators;
pub mod prober;
pub mod report;
pub mod utils;

pub use discovery::ProxyDiscovery;
pub use models::{ConnectionResult, ProbeOutcome, ProxyConfig, TestRunReport};
pub use prober::{ConnectionProbe, Prober};
pub use report::Reporter;

/// `User-Agent` sent with every probe and `CONNECT` request.
pub const USER_AGENT: &str = "ProxyTester/1.0";

/// Initializes the logging system for the application.
///
/// This function configures the logging system with the specified verbosity level.
///
/// # Arguments
///
/// * `log_level`: The desired verbosity level for logging. Determines which log messages will be displayed.
///
/// # Returns
///
/// A result indicating the success or failure of the logging setup.
#[cfg(feature = "log")]
pub fn initialize_logging(log_level: log::LevelFilter) -> anyhow::Result<()> {
    stderrlog::new()
        .module(module_path!()) // Configures the module path for log messages.
        .show_module_names(true) // Enables module names in log output.
        .verbosity(log_level) // Sets the specified log verbosity level.
        .init()?; // Initializes the logger.
    Ok(())
}
