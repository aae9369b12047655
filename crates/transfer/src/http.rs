//! HTTP seam for the executor.
//!
//! The executor only sees [`HttpTransport`]: a request goes in, a status,
//! an optional declared length and a body reader come out. [`ReqwestTransport`]
//! is the production implementation.

use std::fmt::Write as _;
use std::future::Future;
use std::io;
use std::pin::Pin;

use futures_util::TryStreamExt;
use lfs_relay_protocol::Action;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use tokio::io::AsyncRead;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::TransferError;

/// A boxed future returned by transport methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reader feeding an outgoing request body.
pub type RequestReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Reader over an incoming response body.
pub type ResponseBody = Box<dyn AsyncRead + Send + Unpin>;

/// Errors from performing the HTTP exchange itself.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Body of an outgoing request.
pub enum RequestBody {
    Empty,
    Stream {
        reader: RequestReader,
        /// Declared body length; `None` means chunked framing.
        length: Option<u64>,
    },
}

/// A fully constructed outgoing request.
pub struct TransferRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl TransferRequest {
    /// Whether the caller asked for chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        self.headers
            .get(reqwest::header::TRANSFER_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("chunked"))
    }

    /// One-line rendering for diagnostics. Credentials are redacted.
    pub fn trace(&self) -> String {
        let mut out = format!("{} {}", self.method, self.url);
        for (name, value) in &self.headers {
            let shown = if *name == AUTHORIZATION {
                "<redacted>"
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            let _ = write!(out, "; {name}: {shown}");
        }
        out
    }
}

/// Response to a [`TransferRequest`].
pub struct TransferResponse {
    pub status: u16,
    /// Length declared by the server, if any.
    pub content_length: Option<u64>,
    pub body: ResponseBody,
}

impl TransferResponse {
    pub fn is_success(&self) -> bool {
        self.status < 300
    }

    /// Reads the rest of the body and throws it away.
    pub async fn drain(&mut self) -> io::Result<u64> {
        tokio::io::copy(&mut self.body, &mut tokio::io::sink()).await
    }
}

/// Performs HTTP requests on behalf of the executor.
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns once response headers are available.
    fn execute(
        &self,
        request: TransferRequest,
    ) -> TransportFuture<'_, Result<TransferResponse, TransportError>>;
}

/// Builds a bodiless request for `action`, applying its headers verbatim.
pub fn build_request(method: Method, action: &Action) -> Result<TransferRequest, TransferError> {
    let invalid = |reason: String| TransferError::InvalidRequest {
        href: action.href.clone(),
        reason,
    };

    let url = Url::parse(&action.href).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }

    let mut headers = HeaderMap::with_capacity(action.header.len());
    for (name, value) in &action.header {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| invalid(format!("header name {name:?}: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| invalid(format!("header {name:?} value: {e}")))?;
        headers.insert(header_name, header_value);
    }

    Ok(TransferRequest {
        method,
        url,
        headers,
        body: RequestBody::Empty,
    })
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

const USER_AGENT: &str = concat!("lfs-relay/", env!("CARGO_PKG_VERSION"));

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(
        &self,
        request: TransferRequest,
    ) -> TransportFuture<'_, Result<TransferResponse, TransportError>> {
        Box::pin(async move {
            let TransferRequest {
                method,
                url,
                mut headers,
                body,
            } = request;

            let mut builder = self.http.request(method, url);
            if let RequestBody::Stream { reader, length } = body {
                if let Some(length) = length {
                    headers
                        .entry(CONTENT_LENGTH)
                        .or_insert_with(|| HeaderValue::from(length));
                }
                builder = builder.body(reqwest::Body::wrap_stream(ReaderStream::new(reader)));
            }

            let resp = builder.headers(headers).send().await?;
            let status = resp.status().as_u16();
            let content_length = resp.content_length();
            let stream = resp.bytes_stream().map_err(io::Error::other);

            Ok(TransferResponse {
                status,
                content_length,
                body: Box::new(StreamReader::new(Box::pin(stream))),
            })
        })
    }
}
