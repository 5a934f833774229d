mod config;

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use http_body_util::Empty;
use hyper::{
    body::{Bytes, Incoming},
    ext::ReasonPhrase,
    header::{HOST, USER_AGENT},
    Request, Response, Uri,
};
use tokio::time::{timeout, Instant};
use tokio_native_tls::TlsConnector;

pub use config::Config;

use crate::{
    client::{self, DirectClient, ProxyClient},
    models::{ConnectionResult, ProbeOutcome},
    negotiators,
    utils::{error_chain, normalize_proxy, ProbeError},
};

/// Makes one timed request to a URL, optionally through a proxy.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Probes `url`, through `proxy` when one is given.
    ///
    /// Never fails: every failure mode is recorded in the returned result.
    async fn probe(&self, url: &str, proxy: Option<&str>) -> ConnectionResult;

    /// The bound applied to each probe.
    fn request_timeout(&self) -> Duration;
}

/// The HTTP prober used by the command line tool.
pub struct Prober {
    config: Config,
    direct: DirectClient,
    tls: TlsConnector,
}

impl Prober {
    /// Creates a prober from the given configuration.
    ///
    /// # Errors
    ///
    /// Fails when the platform TLS backend cannot be initialized.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let tls = client::tls_connector(config.accept_invalid_certs)?;
        Ok(Self {
            direct: client::direct_client(tls.clone()),
            tls,
            config,
        })
    }

    fn build_request(&self, request_target: Uri, target: &Uri) -> anyhow::Result<Request<Empty<Bytes>>> {
        let mut builder = Request::get(request_target).header(USER_AGENT, self.config.user_agent.as_str());
        if let Some(authority) = target.authority() {
            builder = builder.header(HOST, authority.as_str());
        }
        Ok(builder.body(Empty::<Bytes>::new())?)
    }

    /// Sends the request and waits for the response head.
    async fn fetch(&self, url: &str, proxy: Option<&str>) -> anyhow::Result<Response<Incoming>> {
        let target = parse_target(url)?;

        match proxy {
            None => {
                let req = self.build_request(target.clone(), &target)?;
                Ok(self.direct.request(req).await?)
            }
            Some(proxy) => {
                let client = ProxyClient::new(proxy, self.tls.clone())?;
                let negotiator = negotiators::for_target(&target);
                let req = self.build_request(negotiator.request_target(&target), &target)?;
                client.send_request(req, &target, negotiator.as_ref()).await
            }
        }
    }
}

#[async_trait]
impl ConnectionProbe for Prober {
    async fn probe(&self, url: &str, proxy: Option<&str>) -> ConnectionResult {
        let proxy = proxy.map(normalize_proxy);

        let start_time = Instant::now();
        let outcome = match timeout(self.config.request_timeout, self.fetch(url, proxy.as_deref())).await {
            Ok(Ok(response)) => classify_response(&response),
            Ok(Err(err)) => classify_error(&err),
            Err(_) => ProbeOutcome::Timeout,
        };
        let result = ConnectionResult::new(url, proxy, outcome, start_time.elapsed());

        #[cfg(feature = "log")]
        log::debug!("{}", result);
        result
    }

    fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }
}

/// Parses a probe target, accepting only absolute `http` and `https` URLs.
fn parse_target(url: &str) -> Result<Uri, ProbeError> {
    let uri: Uri = url
        .trim()
        .parse()
        .map_err(|e| ProbeError::InvalidUrl(format!("invalid url {}: {}", url, e)))?;

    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        Some(other) => return Err(ProbeError::InvalidUrl(format!("unknown url type: {}", other))),
        None => return Err(ProbeError::InvalidUrl(format!("unknown url type: {}", url))),
    }
    if uri.host().map_or(true, str::is_empty) {
        return Err(ProbeError::InvalidUrl(format!("no host given: {}", url)));
    }
    Ok(uri)
}

/// Classifies a received response. 2xx and 3xx count as reachable.
pub fn classify_response<B>(response: &Response<B>) -> ProbeOutcome {
    let status = response.status();
    if status.is_success() || status.is_redirection() {
        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            headers.insert(
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        return ProbeOutcome::Success {
            status: status.as_u16(),
            headers,
        };
    }

    let reason = response
        .extensions()
        .get::<ReasonPhrase>()
        .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string());

    ProbeOutcome::HttpError {
        status: status.as_u16(),
        reason,
    }
}

/// Classifies a failure that happened before any response arrived.
///
/// Connection level failures (bad URL or proxy, DNS, refused or reset
/// connections, tunnel and TLS errors) are transport errors; anything hyper
/// reports after the connection is up is unclassified.
pub fn classify_error(err: &anyhow::Error) -> ProbeOutcome {
    let reason = {
        let err: &(dyn std::error::Error + 'static) = err.as_ref();
        error_chain(err)
    };

    let is_transport = if let Some(err) = err.downcast_ref::<hyper_util::client::legacy::Error>() {
        err.is_connect()
    } else {
        err.downcast_ref::<ProbeError>().is_some()
            || err.downcast_ref::<std::io::Error>().is_some()
            || err.downcast_ref::<native_tls::Error>().is_some()
    };

    if is_transport {
        ProbeOutcome::TransportError { reason }
    } else {
        ProbeOutcome::Unknown {
            description: reason,
        }
    }
}
