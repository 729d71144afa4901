use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use hyper::{Body, Client, HeaderMap, Method, Request, StatusCode, Uri};
use hyper::client::HttpConnector;
use hyper::header::{HeaderName, HeaderValue, USER_AGENT};
use hyper_tls::HttpsConnector;
use thiserror::Error;
use tracing::{debug, trace};

use crate::util::retry::{FailureClass, RetryDecision, RetryPolicy};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request for {uri}: {reason}")]
    InvalidRequest { uri: String, reason: String },
    #[error("request to {uri} timed out")]
    Timeout { uri: String },
    #[error("connection to {uri} closed without a response: {source}")]
    NoResponse { uri: String, source: hyper::Error },
    #[error("could not connect to {uri}: {source}")]
    Connect { uri: String, source: hyper::Error },
    #[error("request to {uri} failed: {source}")]
    Protocol { uri: String, source: hyper::Error },
    #[error("giving up on {uri} after {attempts} attempts: {last}")]
    RetriesExhausted {
        uri: String,
        attempts: u32,
        #[source]
        last: Box<TransportError>,
    },
}
impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Timeout { .. } | TransportError::NoResponse { .. })
    }

    fn class(&self) -> FailureClass {
        if self.is_transient() { FailureClass::Transient } else { FailureClass::Terminal }
    }

    fn from_hyper(uri: &str, error: hyper::Error) -> TransportError {
        let uri = uri.to_string();

        if error.is_timeout() || has_io_error_kind(&error, &[io::ErrorKind::TimedOut]) {
            TransportError::Timeout { uri }
        }
        else if error.is_connect() {
            TransportError::Connect { uri, source: error }
        }
        else if error.is_incomplete_message()
            || error.is_canceled()
            || has_io_error_kind(&error, &[
                io::ErrorKind::ConnectionReset,
                io::ErrorKind::ConnectionAborted,
                io::ErrorKind::BrokenPipe,
                io::ErrorKind::UnexpectedEof,
            ]) {
            TransportError::NoResponse { uri, source: error }
        }
        else {
            TransportError::Protocol { uri, source: error }
        }
    }
}

fn has_io_error_kind(error: &(dyn StdError + 'static), kinds: &[io::ErrorKind]) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if let Some(io_error) = e.downcast_ref::<io::Error>() {
            if kinds.contains(&io_error.kind()) {
                return true;
            }
        }
        current = e.source();
    }
    false
}


#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
}
impl HttpRequest {
    pub fn get(uri: impl Into<String>) -> HttpRequest {
        HttpRequest {
            method: Method::GET,
            uri: uri.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn head(uri: impl Into<String>) -> HttpRequest {
        HttpRequest {
            method: Method::HEAD,
            ..HttpRequest::get(uri)
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> HttpRequest {
        self.headers.insert(name, value);
        self
    }

    fn to_hyper(&self, user_agent: &str) -> Result<Request<Body>, TransportError> {
        let invalid = |reason: String| TransportError::InvalidRequest {
            uri: self.uri.clone(),
            reason,
        };

        let uri = Uri::try_from(self.uri.as_str())
            .map_err(|e| invalid(e.to_string()))?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(invalid("not an absolute URI".to_string()));
        }

        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(uri)
            .header(USER_AGENT, user_agent);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty())
            .map_err(|e| invalid(e.to_string()))
    }
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone, Debug)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    /// bounds the entire exchange of a single attempt, including reading the body
    pub read_timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}
impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            max_attempts: 2,
            retry_delay: Duration::from_millis(500),
            // Maven Central returns a 403 without a user agent
            user_agent: "curl/7.68.0".to_string(),
        }
    }
}

/// Sends requests, retrying only where no response was received at all. Responses with error
///  status codes are returned to the caller like any other response.
///
/// Instances do HTTP connection caching internally, so keeping them alive has performance benefits.
pub struct HttpTransport {
    client: Client<HttpsConnector<HttpConnector>>,
    settings: TransportSettings,
}
impl HttpTransport {
    pub fn new(settings: TransportSettings) -> HttpTransport {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(settings.connect_timeout));

        HttpTransport {
            client: Client::builder()
                .build::<_, Body>(HttpsConnector::new_with_connector(http)),
            settings,
        }
    }

    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut policy = RetryPolicy::new(self.settings.max_attempts, self.settings.retry_delay);

        loop {
            let failure = match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(failure) => failure,
            };

            match policy.on_failure(failure.class()) {
                RetryDecision::RetryAfter(delay) => {
                    debug!("{} {} failed: {} - retrying in {:?}", request.method, request.uri, failure, delay);
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    return if failure.is_transient() {
                        Err(TransportError::RetriesExhausted {
                            uri: request.uri.clone(),
                            attempts: policy.attempts(),
                            last: Box::new(failure),
                        })
                    }
                    else {
                        Err(failure)
                    };
                }
            }
        }
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let hyper_request = request.to_hyper(&self.settings.user_agent)?;
        trace!("sending {} {}", request.method, request.uri);

        let exchange = async {
            let response = self.client.request(hyper_request).await?;
            let (parts, body) = response.into_parts();
            let body = hyper::body::to_bytes(body).await?;
            Ok::<_, hyper::Error>(HttpResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        match tokio::time::timeout(self.settings.read_timeout, exchange).await {
            Ok(Ok(response)) => {
                trace!("{} {} -> {}", request.method, request.uri, response.status);
                Ok(response)
            }
            Ok(Err(e)) => Err(TransportError::from_hyper(&request.uri, e)),
            Err(_) => Err(TransportError::Timeout { uri: request.uri.clone() }),
        }
    }
}
