// Transport layer: a single HTTP call to the photoapp web service.
//
// `Transport` is the seam between the retry executor and the network.
// `HttpTransport` is the real implementation on top of a blocking reqwest
// client; tests swap in a scripted transport instead.

use crate::error::{ClientError, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// HTTP verbs used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
        };
        f.write_str(s)
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// One call to make: verb, absolute URL and an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    method: Method,
    url: String,
    payload: Option<Value>,
}

impl CallRequest {
    pub fn get(url: impl Into<String>) -> Self {
        CallRequest {
            method: Method::Get,
            url: url.into(),
            payload: None,
        }
    }

    pub fn post<T: Serialize>(url: impl Into<String>, body: &T) -> serde_json::Result<Self> {
        Self::with_body(Method::Post, url, body)
    }

    pub fn put<T: Serialize>(url: impl Into<String>, body: &T) -> serde_json::Result<Self> {
        Self::with_body(Method::Put, url, body)
    }

    fn with_body<T: Serialize>(
        method: Method,
        url: impl Into<String>,
        body: &T,
    ) -> serde_json::Result<Self> {
        Ok(CallRequest {
            method,
            url: url.into(),
            payload: Some(serde_json::to_value(body)?),
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

/// Status code and body text of a response that reached the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        RawResponse {
            status,
            body: body.into(),
        }
    }
}

/// Why a call never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server answered but the body could not be read.
    #[error("malformed response: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let msg = e.to_string();
        if e.is_timeout() {
            TransportError::Timeout(msg)
        } else if e.is_connect() {
            TransportError::Connect(msg)
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(msg)
        } else {
            TransportError::Other(msg)
        }
    }
}

/// Something that can perform a single HTTP call.
///
/// Implementations must return every HTTP status as `Ok`; `Err` is reserved
/// for calls that never got an answer.
pub trait Transport {
    fn send(&self, request: &CallRequest) -> std::result::Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &CallRequest) -> std::result::Result<RawResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking reqwest transport with a per-call timeout.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &CallRequest) -> std::result::Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method().into(), request.url());
        if let Some(body) = request.payload() {
            builder = builder.json(body);
        }
        let res = builder.send()?;
        let status = res.status().as_u16();
        let body = res.text()?;
        Ok(RawResponse { status, body })
    }
}
