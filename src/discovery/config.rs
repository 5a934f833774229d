/// Hosts commonly running a forward proxy on a workstation or LAN.
pub const COMMON_HOSTS: [&str; 4] = ["127.0.0.1", "localhost", "192.168.1.1", "10.0.0.1"];

/// Ports forward proxies commonly listen on.
pub const COMMON_PORTS: [u16; 7] = [8080, 3128, 8888, 8118, 1080, 3129, 8081];

/// Options for configuring proxy discovery.
#[derive(Debug, Clone)]
pub struct Config {
    /// Guess proxies on the common hosts and ports in addition to the environment.
    pub auto_detect: bool,
    /// Hosts combined with `common_ports` when `auto_detect` is set.
    pub common_hosts: Vec<String>,
    /// Ports combined with `common_hosts` when `auto_detect` is set.
    pub common_ports: Vec<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_detect: true,
            common_hosts: COMMON_HOSTS.iter().map(|host| host.to_string()).collect(),
            common_ports: COMMON_PORTS.to_vec(),
        }
    }
}
