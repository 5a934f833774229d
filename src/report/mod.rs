mod config;

use std::{fs, path::Path};

#[cfg(feature = "color")]
use colored::Colorize;

pub use config::{Config, DEFAULT_URLS};

use crate::{
    discovery::ProxyDiscovery,
    models::{ConnectionResult, ProxyResults, TestRunReport},
    prober::ConnectionProbe,
    utils::normalize_proxy,
};

/// Runs every probe of a test run and collects the results.
pub struct Reporter<P> {
    config: Config,
    discovery: ProxyDiscovery,
    prober: P,
}

impl<P> Reporter<P>
where
    P: ConnectionProbe,
{
    /// Creates a reporter that probes the configured URLs with `prober`.
    pub fn new(config: Config, discovery: ProxyDiscovery, prober: P) -> Self {
        Self {
            config,
            discovery,
            prober,
        }
    }

    /// The probe implementation used for every connection.
    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Probes every URL directly, then the leading URLs through each candidate proxy.
    ///
    /// # Arguments
    ///
    /// * `custom_proxies`: Proxies supplied by the user, tested after the discovered ones.
    ///
    /// # Returns
    ///
    /// The full report. Probe failures are recorded in it, never returned as errors.
    pub async fn run_comprehensive_test(&self, custom_proxies: &[String]) -> TestRunReport {
        let mut report = TestRunReport {
            system_proxy_config: self.discovery.system_proxy_config().clone(),
            ..Default::default()
        };

        self.progress("🔍 Starting Network Connection Tests...");
        self.progress(format!(
            "⏱️  Timeout: {} seconds\n",
            self.prober.request_timeout().as_secs_f64()
        ));

        self.progress("📡 Testing direct connections (no proxy)...");
        for url in &self.config.urls {
            self.progress(format!("  Testing: {}", url));
            let result = self.prober.probe(url, None).await;
            self.progress(format!("    {}", outcome_line(&result)));
            report.summary.record(&result);
            report.direct_connections.push(result);
        }
        self.progress("");

        let candidates = self.discovery.candidates_with(custom_proxies);
        if candidates.is_empty() {
            self.progress("🔍 No proxy servers discovered for testing");
            return report;
        }

        self.progress(format!(
            "🔍 Testing {} discovered proxy servers...",
            candidates.len()
        ));
        let per_proxy = self.config.per_proxy_urls.min(self.config.urls.len());
        for proxy in candidates {
            let proxy = normalize_proxy(&proxy);
            self.progress(format!("\n  🌐 Testing proxy: {}", proxy));

            let mut results = Vec::with_capacity(per_proxy);
            for url in &self.config.urls[..per_proxy] {
                self.progress(format!("    Testing: {}", url));
                let result = self.prober.probe(url, Some(&proxy)).await;
                self.progress(format!("      {}", outcome_line(&result)));
                report.summary.record(&result);
                results.push(result);
            }
            report.proxy_connections.push(ProxyResults { proxy, results });
        }

        #[cfg(feature = "log")]
        log::debug!(
            "Finished {} probes ({} succeeded)",
            report.summary.total_tests,
            report.summary.successful_tests
        );
        report
    }

    fn progress<S>(&self, line: S)
    where
        S: AsRef<str>,
    {
        if self.config.print_progress {
            println!("{}", line.as_ref());
        }
    }
}

/// One line describing how a probe ended.
fn outcome_line(result: &ConnectionResult) -> String {
    match &result.error_message {
        None => {
            let line = format!("✅ Success ({:.2}s)", result.response_time.as_secs_f64());
            #[cfg(feature = "color")]
            let line = line.green().to_string();
            line
        }
        Some(message) => {
            let line = format!("❌ Failed: {}", message);
            #[cfg(feature = "color")]
            let line = line.red().to_string();
            line
        }
    }
}

/// Renders the totals, the success rate and the active proxy settings.
pub fn format_summary(report: &TestRunReport) -> String {
    let summary = &report.summary;
    let rate = match summary.success_rate() {
        Some(rate) => format!("{:.1}%", rate),
        None => "n/a (no tests run)".to_string(),
    };

    let mut lines = vec![
        "\n📊 Test Summary:".to_string(),
        format!("   Total tests: {}", summary.total_tests),
        format!("   Successful: {}", summary.successful_tests),
        format!("   Failed: {}", summary.failed_tests),
        format!("   Success rate: {}", rate),
    ];

    let active = report.system_proxy_config.active();
    if !active.is_empty() {
        lines.push("\n🔧 Active system proxy configuration:".to_string());
        lines.extend(
            active
                .into_iter()
                .map(|(name, value)| format!("   {}: {}", name, value)),
        );
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Prints [`format_summary`] to standard output.
pub fn print_summary(report: &TestRunReport) {
    print!("{}", format_summary(report));
}

/// Writes the report as indented JSON.
///
/// The data goes to a hidden sibling file first and is renamed over `path`
/// once complete, so `path` never holds a partial report.
///
/// # Arguments
///
/// * `report`: The report to save.
/// * `path`: Destination file.
pub fn save_results(report: &TestRunReport, path: &Path) -> anyhow::Result<()> {
    let file_name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => anyhow::bail!("{} is not a file path", path.display()),
    };
    let partial = path.with_file_name(format!(".{}.partial", file_name));

    let json = serde_json::to_string_pretty(report)?;
    fs::write(&partial, json)?;
    if let Err(e) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }

    #[cfg(feature = "log")]
    log::debug!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, time::Duration};

    use super::*;
    use crate::models::{ProbeOutcome, ProxyConfig, Summary};

    fn report_with(summary: Summary, system: ProxyConfig) -> TestRunReport {
        TestRunReport {
            system_proxy_config: system,
            summary,
            ..Default::default()
        }
    }

    #[test]
    fn summary_without_tests_does_not_divide() {
        let text = format_summary(&TestRunReport::default());
        assert!(text.contains("Total tests: 0"));
        assert!(text.contains("Success rate: n/a (no tests run)"));
    }

    #[test]
    fn summary_is_one_block_of_lines() {
        let text = format_summary(&TestRunReport::default());
        assert!(text.starts_with("\n📊 Test Summary:\n   Total tests: 0\n"));
        assert!(text.ends_with("(no tests run)\n"));
    }

    #[test]
    fn summary_rate_has_one_decimal() {
        let summary = Summary {
            total_tests: 3,
            successful_tests: 2,
            failed_tests: 1,
        };
        let text = format_summary(&report_with(summary, ProxyConfig::default()));
        assert!(text.contains("Success rate: 66.7%"));
        assert!(!text.contains("Active system proxy configuration"));
    }

    #[test]
    fn summary_lists_active_proxy_settings() {
        let system = ProxyConfig {
            https_proxy: Some("http://corp:3128".into()),
            no_proxy: Some("localhost".into()),
            ..Default::default()
        };
        let text = format_summary(&report_with(Summary::default(), system));
        assert!(text.contains("https_proxy: http://corp:3128"));
        assert!(text.contains("no_proxy: localhost"));
        assert!(!text.contains("http_proxy:"));
    }

    #[test]
    fn outcome_line_mentions_error() {
        let result = ConnectionResult::new(
            "http://a",
            None,
            ProbeOutcome::Timeout,
            Duration::from_secs(1),
        );
        assert!(outcome_line(&result).contains("Failed: Connection timeout"));

        let result = ConnectionResult::new(
            "http://a",
            None,
            ProbeOutcome::Success {
                status: 200,
                headers: BTreeMap::new(),
            },
            Duration::from_millis(250),
        );
        assert!(outcome_line(&result).contains("Success (0.25s)"));
    }
}
