use std::time::Duration;

/// Options for configuring how each probe is made.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound for a single attempt, from connect to response head.
    pub request_timeout: Duration,
    /// Sent as the `User-Agent` header of every request.
    pub user_agent: String,
    /// Accept invalid TLS certificates and hostnames.
    pub accept_invalid_certs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}
