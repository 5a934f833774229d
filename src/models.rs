use std::{collections::BTreeMap, fmt::Display, time::Duration};

use serde::{Serialize, Serializer};

/// Environment variables inspected for system proxy settings, lowercase first.
const PROXY_VARIABLES: [(&str, &str); 4] = [
    ("http_proxy", "HTTP_PROXY"),
    ("https_proxy", "HTTPS_PROXY"),
    ("ftp_proxy", "FTP_PROXY"),
    ("no_proxy", "NO_PROXY"),
];

/// Snapshot of the proxy settings found in the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProxyConfig {
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub ftp_proxy: Option<String>,
    pub no_proxy: Option<String>,
}

impl ProxyConfig {
    /// Reads the proxy settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the proxy settings through `lookup`, preferring the lowercase
    /// variable and falling back to the uppercase one. Empty values count as unset.
    ///
    /// # Arguments
    ///
    /// * `lookup`: Resolves a variable name to its value, if any.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |(lower, upper): (&str, &str)| {
            lookup(lower)
                .filter(|value| !value.is_empty())
                .or_else(|| lookup(upper).filter(|value| !value.is_empty()))
        };

        Self {
            http_proxy: read(PROXY_VARIABLES[0]),
            https_proxy: read(PROXY_VARIABLES[1]),
            ftp_proxy: read(PROXY_VARIABLES[2]),
            no_proxy: read(PROXY_VARIABLES[3]),
        }
    }

    /// Returns every `(name, value)` pair, set or not, in a fixed order.
    pub fn entries(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("http_proxy", self.http_proxy.as_deref()),
            ("https_proxy", self.https_proxy.as_deref()),
            ("ftp_proxy", self.ftp_proxy.as_deref()),
            ("no_proxy", self.no_proxy.as_deref()),
        ]
    }

    /// Returns only the entries that carry a value.
    pub fn active(&self) -> Vec<(&'static str, &str)> {
        self.entries()
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value)))
            .collect()
    }

    /// Returns the configured proxy addresses, skipping `no_proxy`.
    pub fn proxy_addresses(&self) -> Vec<String> {
        self.active()
            .into_iter()
            .filter(|(name, _)| *name != "no_proxy")
            .map(|(_, value)| value.to_string())
            .collect()
    }
}

/// The classified result of a single probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// A 2xx or 3xx response arrived.
    Success {
        status: u16,
        headers: BTreeMap<String, String>,
    },
    /// The server answered with any other status.
    HttpError { status: u16, reason: String },
    /// The request never produced a response: DNS, connect, tunnel or TLS failure.
    TransportError { reason: String },
    /// No response within the configured timeout.
    Timeout,
    /// Anything the other variants do not cover.
    Unknown { description: String },
}

fn serialize_seconds<S>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// One probe attempt as it appears in the report.
///
/// Built only through [`ConnectionResult::new`], so `success` and
/// `error_message` can never disagree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResult {
    pub url: String,
    pub proxy: Option<String>,
    pub success: bool,
    pub response_code: Option<u16>,
    #[serde(rename = "responseTimeSeconds", serialize_with = "serialize_seconds")]
    pub response_time: Duration,
    pub error_message: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
}

impl ConnectionResult {
    /// Converts a probe outcome into a report entry.
    ///
    /// # Arguments
    ///
    /// * `url`: The target that was probed.
    /// * `proxy`: The normalized proxy address, `None` for direct probes.
    /// * `outcome`: How the probe ended.
    /// * `response_time`: Wall-clock duration of the attempt.
    pub fn new(
        url: &str,
        proxy: Option<String>,
        outcome: ProbeOutcome,
        response_time: Duration,
    ) -> Self {
        let transport_prefix = if proxy.is_some() {
            "Proxy Error"
        } else {
            "URL Error"
        };

        let (success, response_code, error_message, headers) = match outcome {
            ProbeOutcome::Success { status, headers } => (true, Some(status), None, Some(headers)),
            ProbeOutcome::HttpError { status, reason } => (
                false,
                Some(status),
                Some(format!("HTTP Error: {} - {}", status, reason)),
                None,
            ),
            ProbeOutcome::TransportError { reason } => (
                false,
                None,
                Some(format!("{}: {}", transport_prefix, reason)),
                None,
            ),
            ProbeOutcome::Timeout => (false, None, Some("Connection timeout".to_string()), None),
            ProbeOutcome::Unknown { description } => (
                false,
                None,
                Some(format!("Unexpected error: {}", description)),
                None,
            ),
        };

        Self {
            url: url.to_string(),
            proxy,
            success,
            response_code,
            response_time,
            error_message,
            headers,
        }
    }
}

impl Display for ConnectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Probe {}", self.url)?;
        if let Some(proxy) = &self.proxy {
            write!(f, " via {}", proxy)?;
        }
        match &self.error_message {
            None => write!(f, " ok {:.2}s>", self.response_time.as_secs_f64()),
            Some(message) => write!(f, " {}>", message),
        }
    }
}

/// Results of every probe made through a single proxy.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyResults {
    pub proxy: String,
    pub results: Vec<ConnectionResult>,
}

/// Running totals over all probes of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
}

impl Summary {
    /// Counts one finished probe.
    pub fn record(&mut self, result: &ConnectionResult) {
        self.total_tests += 1;
        if result.success {
            self.successful_tests += 1;
        } else {
            self.failed_tests += 1;
        }
    }

    /// Percentage of successful probes, or `None` when nothing ran.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_tests == 0 {
            return None;
        }
        Some(self.successful_tests as f64 / self.total_tests as f64 * 100.0)
    }
}

/// Everything collected during one invocation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunReport {
    pub system_proxy_config: ProxyConfig,
    pub direct_connections: Vec<ConnectionResult>,
    pub proxy_connections: Vec<ProxyResults>,
    pub summary: Summary,
}
