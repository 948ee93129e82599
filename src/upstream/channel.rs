//! Shared upstream HTTP channel.
//!
//! # Responsibilities
//! - Own the one `hyper` client every sub-request is forwarded through
//! - Select plain or encrypted transport from the request URI scheme
//! - Reuse keep-alive connections across the batch, bounded independently
//!   of dispatch concurrency
//! - Optionally tunnel all traffic through a configured forwarding relay
//!
//! # Design Decisions
//! - One client per process; per-request state lives in the request
//! - Relay credentials come from configuration, never from callers

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::http::header::{HeaderValue, USER_AGENT};
use hyper::http::{HeaderMap, Request, Response, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::proxy::Tunnel;
use hyper_util::client::legacy::connect::{Connect, HttpConnector};
use hyper_util::client::legacy::{Client, Error as ClientError};
use hyper_util::rt::TokioExecutor;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;

/// The forwarding channel shared by all sub-requests.
pub struct UpstreamChannel {
    transport: Transport,
    default_headers: HeaderMap,
}

/// Direct connections, or everything tunneled through a CONNECT relay.
enum Transport {
    Direct(Client<HttpsConnector<HttpConnector>, Full<Bytes>>),
    Relayed(Client<HttpsConnector<Tunnel<HttpConnector>>, Full<Bytes>>),
}

impl UpstreamChannel {
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let mut default_headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|_| {
            GatewayError::Upstream(format!("invalid user agent: {}", config.user_agent))
        })?;
        default_headers.insert(USER_AGENT, agent);

        let transport = match &config.relay_proxy {
            None => {
                let https = HttpsConnectorBuilder::new()
                    .with_webpki_roots()
                    .https_or_http()
                    .enable_http1()
                    .enable_http2()
                    .build();
                Transport::Direct(build_client(config, https))
            }
            Some(relay) => {
                let relay_uri: Uri = relay.uri.parse().map_err(|_| {
                    GatewayError::Upstream(format!("invalid relay URI: {}", relay.uri))
                })?;
                let mut tunnel = Tunnel::new(relay_uri, HttpConnector::new());
                if let Some(authorization) = &relay.authorization {
                    let value = HeaderValue::from_str(authorization).map_err(|_| {
                        GatewayError::Upstream("invalid relay authorization value".to_string())
                    })?;
                    tunnel = tunnel.with_auth(value);
                }
                let https = HttpsConnectorBuilder::new()
                    .with_webpki_roots()
                    .https_or_http()
                    .enable_http1()
                    .enable_http2()
                    .wrap_connector(tunnel);
                Transport::Relayed(build_client(config, https))
            }
        };

        Ok(Self {
            transport,
            default_headers,
        })
    }

    /// Forward one request. Scheme-based channel selection happens inside
    /// the connector; callers only see the shared pool.
    pub async fn send(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, ClientError> {
        match &self.transport {
            Transport::Direct(client) => client.request(request).await,
            Transport::Relayed(client) => client.request(request).await,
        }
    }

    /// Headers merged under caller-supplied headers on every sub-request.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }
}

fn build_client<C>(config: &UpstreamConfig, connector: C) -> Client<C, Full<Bytes>>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build(connector)
}
