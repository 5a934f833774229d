mod config;

use hashbrown::HashSet;

pub use config::{Config, COMMON_HOSTS, COMMON_PORTS};

use crate::{models::ProxyConfig, utils::normalize_proxy};

/// Builds the list of proxies worth probing.
pub struct ProxyDiscovery {
    config: Config,
    system: ProxyConfig,
}

impl ProxyDiscovery {
    /// Creates a discovery over an explicit proxy configuration snapshot.
    pub fn new(config: Config, system: ProxyConfig) -> Self {
        Self { config, system }
    }

    /// Creates a discovery over the proxy settings of the current process.
    pub fn from_env(config: Config) -> Self {
        Self::new(config, ProxyConfig::from_env())
    }

    /// The proxy settings found in the environment.
    pub fn system_proxy_config(&self) -> &ProxyConfig {
        &self.system
    }

    /// Every `http://{host}:{port}` combination of the configured hosts and ports.
    pub fn common_candidates(&self) -> Vec<String> {
        self.config
            .common_hosts
            .iter()
            .flat_map(|host| {
                self.config
                    .common_ports
                    .iter()
                    .map(move |port| format!("http://{}:{}", host, port))
            })
            .collect()
    }

    /// Environment proxies followed by the common guesses, without duplicates.
    pub fn discover_candidates(&self) -> Vec<String> {
        self.candidates_with(&[])
    }

    /// Discovered candidates followed by `custom` proxies.
    ///
    /// Addresses are compared after normalization, so `host:3128` and
    /// `http://host:3128` are probed once. The first spelling seen is kept.
    pub fn candidates_with(&self, custom: &[String]) -> Vec<String> {
        let mut found = self.system.proxy_addresses();
        if self.config.auto_detect {
            found.extend(self.common_candidates());
        }
        found.extend(custom.iter().cloned());

        let mut seen = HashSet::new();
        let candidates: Vec<String> = found
            .into_iter()
            .filter(|proxy| seen.insert(normalize_proxy(proxy)))
            .collect();

        #[cfg(feature = "log")]
        log::debug!(
            "Discovered {} proxy candidates ({} custom)",
            candidates.len(),
            custom.len()
        );
        candidates
    }
}
