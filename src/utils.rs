use std::error::Error;

/// Transport failures raised by this crate before any response exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    /// The target URL could not be used.
    #[error("{0}")]
    InvalidUrl(String),
    /// The proxy address could not be used.
    #[error("{0}")]
    InvalidProxy(String),
    /// The proxy refused to open a `CONNECT` tunnel.
    #[error("Tunnel connection failed: {code} {reason}")]
    TunnelRefused { code: u16, reason: String },
    /// The proxy's reply to `CONNECT` was unusable.
    #[error("Tunnel connection failed: {0}")]
    TunnelFailed(String),
}

/// Prefixes `http://` to a proxy address that carries no scheme.
///
/// # Arguments
///
/// * `address`: A proxy address such as `myproxy:3128` or `http://myproxy:3128`.
///
/// # Returns
///
/// The address with an explicit scheme.
pub fn normalize_proxy(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// Joins an error and all of its sources into a single line.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if !parts.iter().any(|part| part.contains(&text)) {
            parts.push(text);
        }
        current = source.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_scheme_when_missing() {
        assert_eq!(normalize_proxy("myproxy:3128"), "http://myproxy:3128");
        assert_eq!(normalize_proxy(" 10.0.0.1:8080 "), "http://10.0.0.1:8080");
    }

    #[test]
    fn keeps_existing_scheme() {
        assert_eq!(normalize_proxy("http://myproxy:3128"), "http://myproxy:3128");
        assert_eq!(normalize_proxy("socks5://s:1080"), "socks5://s:1080");
    }

    #[test]
    fn error_chain_includes_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let outer = anyhow::Error::new(inner).context("connect failed");
        let err: &(dyn Error + 'static) = outer.as_ref();
        assert_eq!(error_chain(err), "connect failed: refused");
    }

    #[test]
    fn tunnel_refusal_reads_like_a_status_line() {
        let err = ProbeError::TunnelRefused {
            code: 407,
            reason: "Proxy Authentication Required".into(),
        };
        assert_eq!(
            err.to_string(),
            "Tunnel connection failed: 407 Proxy Authentication Required"
        );
    }

    #[test]
    fn invalid_proxy_message_is_passed_through() {
        let err = ProbeError::InvalidProxy("unsupported proxy scheme `socks5`".into());
        assert_eq!(err.to_string(), "unsupported proxy scheme `socks5`");
        assert_eq!(
            ProbeError::TunnelFailed("reply headers too large".into()).to_string(),
            "Tunnel connection failed: reply headers too large"
        );
    }
}
