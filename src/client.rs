use std::fmt::{Debug, Display};

use http_body_util::Empty;
use hyper::{
    body::{Bytes, Incoming},
    client::conn::http1::handshake,
    Request, Response, Uri,
};
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
};
use tokio::{net::TcpStream, task::JoinHandle, time};
use tokio_native_tls::TlsConnector;

use crate::{negotiators::NegotiatorTrait, utils::ProbeError};

/// Host of a URI without the brackets around IPv6 literals.
fn bare_host(host: &str) -> &str {
    host.trim_start_matches('[').trim_end_matches(']')
}

/// Pooled client used for probes without a proxy.
pub type DirectClient = Client<HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// Builds the TLS connector shared by direct and tunnelled probes.
///
/// # Arguments
///
/// * `accept_invalid_certs`: Skip certificate and hostname verification.
pub fn tls_connector(accept_invalid_certs: bool) -> anyhow::Result<TlsConnector> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(accept_invalid_certs)
        .danger_accept_invalid_hostnames(accept_invalid_certs)
        .build()?;
    Ok(TlsConnector::from(connector))
}

/// Creates the client for direct probes. Connections are not kept idle so
/// every probe pays for its own DNS lookup, TCP and TLS handshake.
pub fn direct_client(tls: TlsConnector) -> DirectClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    let connector = HttpsConnector::from((http, tls));
    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(0)
        .build(connector)
}

/// Aborts the connection driver when the request is done or abandoned.
struct ConnectionTask(JoinHandle<()>);

impl Drop for ConnectionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A client that sends a single request through an HTTP proxy.
pub struct ProxyClient {
    /// The normalized proxy address, e.g. `http://127.0.0.1:8080`.
    pub proxy: String,
    host: String,
    port: u16,
    tls: TlsConnector,
}

impl Debug for ProxyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyClient")
            .field("proxy", &self.proxy)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl ProxyClient {
    /// Creates a new instance of `ProxyClient`.
    ///
    /// # Arguments
    ///
    /// * `proxy`: A normalized proxy address. Only the `http` scheme is supported;
    ///   the port defaults to 80.
    /// * `tls`: Connector used when the target requires TLS.
    ///
    /// # Returns
    ///
    /// The client, or a `ProbeError::InvalidProxy` if the address is unusable.
    pub fn new(proxy: &str, tls: TlsConnector) -> Result<Self, ProbeError> {
        let uri: Uri = proxy
            .parse()
            .map_err(|e| ProbeError::InvalidProxy(format!("invalid proxy address {}: {}", proxy, e)))?;

        match uri.scheme_str() {
            Some("http") => {}
            other => {
                return Err(ProbeError::InvalidProxy(format!(
                    "unsupported proxy scheme `{}`",
                    other.unwrap_or_default()
                )))
            }
        }

        let host = uri
            .host()
            .map(bare_host)
            .ok_or_else(|| ProbeError::InvalidProxy(format!("no host in proxy address {}", proxy)))?
            .to_string();

        Ok(Self {
            proxy: proxy.to_string(),
            port: uri.port_u16().unwrap_or(80),
            host,
            tls,
        })
    }

    /// Establishes a TCP connection to the proxy server.
    async fn connect(&self) -> anyhow::Result<TcpStream> {
        let start_time = time::Instant::now();
        self.log_trace("Starting TCP connection");

        let tcp_stream = TcpStream::connect((self.host.as_str(), self.port)).await?;

        self.log_trace(format!("Connected in {:?}", start_time.elapsed()));
        Ok(tcp_stream)
    }

    /// Wraps the tunnel in TLS for `domain` and sends the request over it.
    ///
    /// # Arguments
    ///
    /// * `req`: The HTTP request to send, in origin form.
    /// * `stream`: A TCP stream with an open tunnel to the target.
    /// * `domain`: The target host, used for SNI and certificate checks.
    pub async fn send_with_tls(
        &self,
        req: Request<Empty<Bytes>>,
        stream: TcpStream,
        domain: &str,
    ) -> anyhow::Result<Response<Incoming>> {
        self.log_trace("Starting TLS connection");
        let start_time = time::Instant::now();
        let tls_stream = self.tls.connect(domain, stream).await?;
        self.log_trace(format!(
            "TLS connection established in {:?}",
            start_time.elapsed()
        ));

        let (mut sender, conn) = handshake(TokioIo::new(tls_stream)).await?;
        let _driver = self.drive(conn);

        self.log_trace(format!("Sending request: {:?}", req));
        Ok(sender.send_request(req).await?)
    }

    /// Sends the request as-is over a plain connection to the proxy.
    ///
    /// # Arguments
    ///
    /// * `req`: The HTTP request to send, in absolute form.
    /// * `stream`: The TCP stream connected to the proxy.
    pub async fn send_without_tls(
        &self,
        req: Request<Empty<Bytes>>,
        stream: TcpStream,
    ) -> anyhow::Result<Response<Incoming>> {
        let (mut sender, conn) = handshake(TokioIo::new(stream)).await?;
        let _driver = self.drive(conn);

        self.log_trace(format!("Sending request: {:?}", req));
        Ok(sender.send_request(req).await?)
    }

    /// Spawns the task that drives an HTTP/1 connection.
    fn drive<F>(&self, conn: F) -> ConnectionTask
    where
        F: std::future::Future<Output = Result<(), hyper::Error>> + Send + 'static,
    {
        #[cfg(feature = "log")]
        let addr = self.proxy.clone();
        ConnectionTask(tokio::task::spawn(async move {
            if let Err(_err) = conn.await {
                #[cfg(feature = "log")]
                if log::max_level().eq(&log::LevelFilter::Trace) {
                    log::error!("{}: Connection error: {}", addr, _err);
                }
            }
        }))
    }

    /// Sends a request through the proxy.
    ///
    /// # Arguments
    ///
    /// * `req`: The HTTP request, with the request target the negotiator expects.
    /// * `target`: The full URI of the probed resource.
    /// * `negotiator`: Prepares the proxy connection before the request is written.
    ///
    /// # Returns
    ///
    /// The response head, or the first error encountered.
    pub async fn send_request<N>(
        &self,
        req: Request<Empty<Bytes>>,
        target: &Uri,
        negotiator: &N,
    ) -> anyhow::Result<Response<Incoming>>
    where
        N: NegotiatorTrait + Send + Sync + ?Sized,
    {
        let mut stream = self.connect().await?;
        negotiator.negotiate(&mut stream, &self.proxy, target).await?;

        if negotiator.with_tls() {
            let domain = target.host().map(bare_host).unwrap_or_default();
            self.send_with_tls(req, stream, domain).await
        } else {
            self.send_without_tls(req, stream).await
        }
    }

    /// Logs a trace message.
    ///
    /// # Arguments
    ///
    /// * `msg`: The message to log.
    #[allow(unused_variables)]
    pub fn log_trace<S>(&self, msg: S)
    where
        S: Display,
    {
        #[cfg(feature = "log")]
        log::trace!("{}: {}", self.proxy, msg);
    }
}
