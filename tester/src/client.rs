use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::CONTENT_LENGTH;
use hyper::{Request, StatusCode};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use load_test_util::drain::{DrainBodyFuture, DrainError};

/// Upper bound on a buffered response body.
pub const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures below the HTTP layer. A response with any status code, 4xx and
/// 5xx included, is not a transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build request")]
    Build(#[from] hyper::http::Error),
    #[error("failed to encode request body")]
    Encode(#[from] serde_json::Error),
    #[error("failed to send request")]
    Send(#[source] BoxError),
    #[error("failed to read response body")]
    Body(#[from] DrainError),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to set up tls")]
    Tls(#[from] native_tls::Error),
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    #[inline]
    #[must_use]
    pub fn is_status(&self, status: StatusCode) -> bool {
        self.status == status
    }

    #[must_use]
    pub fn body_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// The one capability a virtual user needs: send a request, get a status and body back.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: Request<Full<Bytes>>) -> Result<ApiResponse, TransportError>;
}

#[derive(Debug, Copy, Clone)]
pub struct ClientOptions {
    pub verify_tls: bool,
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            verify_tls: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    request_timeout: Duration,
}

impl HttpClient {
    /// Builds a pooled client that speaks both `http` and `https`. With
    /// `verify_tls` off, self-signed certificates and mismatched hostnames
    /// are accepted.
    pub fn new(options: ClientOptions) -> Result<Self, TransportError> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let mut tls = native_tls::TlsConnector::builder();
        if !options.verify_tls {
            tls.danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let tls = tokio_native_tls::TlsConnector::from(tls.build()?);
        let connector = HttpsConnector::from((http, tls));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Ok(Self {
            client,
            request_timeout: options.request_timeout,
        })
    }

    async fn send_recv(&self, request: Request<Full<Bytes>>) -> Result<ApiResponse, TransportError> {
        let resp = self
            .client
            .request(request)
            .await
            .map_err(|e| TransportError::Send(Box::new(e)))?;
        let status = resp.status();
        let content_length: usize = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|hv| hv.parse().ok())
            .unwrap_or(1024);
        let body =
            DrainBodyFuture::new(resp.into_body(), content_length, MAX_RESPONSE_BYTES).await?;
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl ApiTransport for HttpClient {
    async fn send(&self, request: Request<Full<Bytes>>) -> Result<ApiResponse, TransportError> {
        tokio::time::timeout(self.request_timeout, self.send_recv(request))
            .await
            .map_err(|_| TransportError::Timeout(self.request_timeout))?
    }
}
