mod http;
mod https;

use std::fmt::Display;

use async_trait::async_trait;
pub use http::HttpNegotiator;
pub use https::HttpsNegotiator;
use hyper::Uri;
use tokio::net::TcpStream;

/// Prepares a freshly connected proxy stream for an HTTP request to `uri`.
#[async_trait]
pub trait NegotiatorTrait {
    #[allow(unused_variables)]
    async fn negotiate(&self, stream: &mut TcpStream, proxy: &str, uri: &Uri) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether the request must be sent over TLS once negotiation is done.
    fn with_tls(&self) -> bool {
        false
    }

    /// The request target written on the request line.
    fn request_target(&self, uri: &Uri) -> Uri {
        uri.clone()
    }

    /// Logs a trace message.
    ///
    /// # Arguments
    ///
    /// * `proxy`: The proxy the message is about.
    /// * `msg`: The message to log.
    #[allow(unused_variables)]
    fn log_trace<S>(&self, proxy: &str, msg: S)
    where
        S: Display,
        Self: Sized,
    {
        #[cfg(feature = "log")]
        log::trace!("{}: {}", proxy, msg);
    }
}

/// Picks the negotiator matching the scheme of the target URI.
pub fn for_target(uri: &Uri) -> Box<dyn NegotiatorTrait + Send + Sync> {
    if uri.scheme_str() == Some("https") {
        Box::new(HttpsNegotiator)
    } else {
        Box::new(HttpNegotiator)
    }
}
