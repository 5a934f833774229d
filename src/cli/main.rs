use std::time::Duration;

use argument::Cli;
use clap::{error::ErrorKind, Parser};
#[cfg(feature = "log")]
use proxyprobe::initialize_logging;
use proxyprobe::{discovery, prober, report, ProxyDiscovery, Prober, Reporter};
use tokio::runtime;

mod argument;

fn main() {
    if let Err(e) = run_application() {
        eprintln!("\n❌ Unexpected error: {:?}", e);
        std::process::exit(1);
    }
}

fn run_application() -> anyhow::Result<()> {
    let options = match Cli::try_parse() {
        Ok(options) => options,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                eprint!("{}", e);
                std::process::exit(1);
            }
        },
    };

    #[cfg(feature = "log")]
    {
        let log_level = match options.log_level.as_str() {
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Off,
        };
        initialize_logging(log_level)?;
    }

    let mut report_config = report::Config::default();
    report_config.urls.extend(options.urls.iter().cloned());

    let discovery = ProxyDiscovery::from_env(discovery::Config {
        auto_detect: !options.no_auto_detect,
        ..Default::default()
    });

    let runtime = runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async {
        let prober = Prober::new(prober::Config {
            request_timeout: Duration::from_secs(options.timeout),
            accept_invalid_certs: options.insecure,
            ..Default::default()
        })?;
        let reporter = Reporter::new(report_config, discovery, prober);

        let results = tokio::select! {
            results = reporter.run_comprehensive_test(&options.proxies) => results,
            _ = tokio::signal::ctrl_c() => {
                // The partial report is dropped, nothing is written.
                println!("\n\n⚠️  Test interrupted by user");
                std::process::exit(1);
            }
        };

        report::print_summary(&results);

        if let Some(path) = &options.save {
            match report::save_results(&results, path) {
                Ok(()) => println!("\n💾 Results saved to: {}", path.display()),
                Err(e) => println!("\n❌ Failed to save results: {}", e),
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}
