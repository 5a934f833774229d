use clap::builder::styling::AnsiColor;
use clap::builder::{PossibleValue, Styles};
use clap::Parser;

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Green.on_default())
        .literal(AnsiColor::BrightGreen.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
}

/// Test network connections directly and through proxy servers.
#[derive(Parser, Debug, Clone)]
#[command(version, styles = get_styles())]
pub struct Cli {
    /// Timeout in seconds for each request.
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Additional proxy to test. Can be given multiple times.
    #[arg(long = "proxy", value_name = "ADDRESS")]
    pub proxies: Vec<String>,

    /// Additional URL to test. Can be given multiple times.
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Save the full report as JSON to this file.
    #[arg(long, value_name = "PATH")]
    pub save: Option<std::path::PathBuf>,

    /// Only test proxies from the environment and --proxy, skip the common host and port guesses.
    #[arg(long)]
    pub no_auto_detect: bool,

    /// Accept invalid TLS certificates.
    #[arg(long)]
    pub insecure: bool,

    /// Log level for application output.
    #[arg(
        long = "log",
        default_value = "off",
        value_parser([
            PossibleValue::new("debug"),
            PossibleValue::new("info"),
            PossibleValue::new("warn"),
            PossibleValue::new("error"),
            PossibleValue::new("trace"),
            PossibleValue::new("off"),
        ])
    )]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["proxyprobe"]);
        assert_eq!(cli.timeout, 10);
        assert!(cli.proxies.is_empty());
        assert!(cli.urls.is_empty());
        assert!(cli.save.is_none());
        assert!(!cli.no_auto_detect);
    }

    #[test]
    fn repeatable_proxy_and_url() {
        let cli = Cli::parse_from([
            "proxyprobe",
            "--proxy",
            "myproxy:3128",
            "--proxy",
            "http://other:8080",
            "--url",
            "http://internal.test",
            "--timeout",
            "3",
            "--save",
            "out.json",
        ]);
        assert_eq!(cli.proxies, vec!["myproxy:3128", "http://other:8080"]);
        assert_eq!(cli.urls, vec!["http://internal.test"]);
        assert_eq!(cli.timeout, 3);
        assert_eq!(cli.save.as_deref(), Some(std::path::Path::new("out.json")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["proxyprobe", "--timeout", "0"]).is_err());
    }
}
