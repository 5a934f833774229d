use async_trait::async_trait;
use hyper::Uri;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time,
};

use super::NegotiatorTrait;
use crate::utils::ProbeError;

/// Upper bound on the size of the proxy's reply to `CONNECT`.
const MAX_REPLY_SIZE: usize = 8192;

/// A negotiator that opens a `CONNECT` tunnel for HTTPS targets.
pub struct HttpsNegotiator;

impl HttpsNegotiator {
    /// Generates a CONNECT request to be sent to the proxy server.
    ///
    /// # Arguments
    ///
    /// * `authority`: The `host:port` to tunnel to.
    ///
    /// # Returns
    ///
    /// A `String` containing the raw CONNECT request.
    fn generate_connect_request(&self, authority: &str) -> String {
        format!(
            "CONNECT {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: {}\r\n\r\n",
            authority,
            authority,
            crate::USER_AGENT
        )
    }

    /// Reads the proxy's reply up to the end of its header block.
    async fn read_reply(&self, stream: &mut TcpStream) -> anyhow::Result<Vec<u8>> {
        let mut reply = Vec::with_capacity(512);
        let mut chunk = [0u8; 512];
        loop {
            let read = stream.read(&mut chunk).await?;
            if read == 0 {
                return Err(ProbeError::TunnelFailed("proxy closed the connection".into()).into());
            }
            reply.extend_from_slice(&chunk[..read]);
            if reply.windows(4).any(|window| window == b"\r\n\r\n") {
                return Ok(reply);
            }
            if reply.len() > MAX_REPLY_SIZE {
                return Err(ProbeError::TunnelFailed("reply headers too large".into()).into());
            }
        }
    }
}

#[async_trait]
impl NegotiatorTrait for HttpsNegotiator {
    /// Negotiates a tunnel through the proxy to the host of `uri`.
    ///
    /// # Arguments
    ///
    /// * `stream`: The TCP stream connected to the proxy.
    /// * `proxy`: The proxy address, used for logging.
    /// * `uri`: The URI to be accessed through the proxy.
    ///
    /// # Returns
    ///
    /// A result indicating success or failure of the negotiation.
    async fn negotiate(&self, stream: &mut TcpStream, proxy: &str, uri: &Uri) -> anyhow::Result<()> {
        let host = match uri.host() {
            Some(host) => host,
            None => return Err(ProbeError::InvalidUrl("no host in url".into()).into()),
        };
        let authority = format!("{}:{}", host, uri.port_u16().unwrap_or(443));
        let connect_request = self.generate_connect_request(&authority);

        self.log_trace(proxy, format!("Sending a connection request to {}", authority));
        let start_time = time::Instant::now();
        stream.write_all(connect_request.as_bytes()).await?;

        let buf = self.read_reply(stream).await?;
        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut response = httparse::Response::new(&mut headers);
        response
            .parse(&buf)
            .map_err(|e| ProbeError::TunnelFailed(format!("invalid reply: {}", e)))?;

        let code = response.code.unwrap_or_default();
        if code != 200 {
            return Err(ProbeError::TunnelRefused {
                code,
                reason: response.reason.unwrap_or("Unknown reason").to_string(),
            }
            .into());
        }
        self.log_trace(
            proxy,
            format!("Tunnel established in {:?}", start_time.elapsed()),
        );
        Ok(())
    }

    fn with_tls(&self) -> bool {
        true
    }

    /// Inside the tunnel the request line carries only the path.
    fn request_target(&self, uri: &Uri) -> Uri {
        let target = match uri.query() {
            Some(query) => format!("{}?{}", uri.path(), query),
            None => uri.path().to_string(),
        };
        target.parse().unwrap_or_else(|_| Uri::from_static("/"))
    }
}
