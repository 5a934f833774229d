/// URLs probed by default. Proxies are only tried against the first few, so
/// order matters.
pub const DEFAULT_URLS: [&str; 6] = [
    "http://httpbin.org/ip",
    "https://httpbin.org/ip",
    "http://www.google.com",
    "https://www.google.com",
    "http://example.com",
    "https://example.com",
];

/// Options for configuring a test run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Targets probed directly, in order.
    pub urls: Vec<String>,
    /// How many of the leading `urls` are probed through each proxy.
    pub per_proxy_urls: usize,
    /// Print a line per probe while the run is in progress.
    pub print_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: DEFAULT_URLS.iter().map(|url| url.to_string()).collect(),
            per_proxy_urls: 3,
            print_progress: true,
        }
    }
}
