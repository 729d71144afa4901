use std::sync::Arc;

use hyper::StatusCode;
use hyper::header::{AUTHORIZATION, HeaderValue};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use crate::util::http_transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\$\{([^}]*)\}").unwrap();
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
impl Credentials {
    pub fn new(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Replaces `${env.NAME}` references with environment variables. Credentials with references
    ///  that can not be resolved are unusable, so this returns `None` for them.
    pub fn resolve(&self) -> Option<Credentials> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<Credentials> {
        Some(Credentials {
            username: resolve_placeholders(&self.username, &lookup)?,
            password: resolve_placeholders(&self.password, &lookup)?,
        })
    }

    /// The 'Authorization' header value, marked as sensitive so that it is not printed
    fn basic_auth(&self) -> Option<HeaderValue> {
        let encoded = base64::encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::from_str(&format!("Basic {}", encoded)).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}

fn resolve_placeholders(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let mut unresolved = false;
    let resolved = PLACEHOLDER_REGEX.replace_all(value, |captures: &Captures| {
        match captures[1].strip_prefix("env.").and_then(lookup) {
            Some(v) => v,
            None => {
                unresolved = true;
                String::new()
            }
        }
    });

    if unresolved {
        None
    }
    else {
        Some(resolved.into_owned())
    }
}


/// Sends requests with basic auth where credentials are available, falling back to an anonymous
///  request if the server rejects them.
pub struct CredentialNegotiator {
    transport: Arc<HttpTransport>,
}
impl CredentialNegotiator {
    pub fn new(transport: Arc<HttpTransport>) -> CredentialNegotiator {
        CredentialNegotiator {
            transport,
        }
    }

    pub async fn send_with_credentials(&self, request: &HttpRequest, credentials: Option<&Credentials>) -> Result<HttpResponse, TransportError> {
        let resolved = match credentials {
            None => None,
            Some(credentials) => {
                let resolved = credentials.resolve();
                if resolved.is_none() {
                    debug!("credentials for {} contain unresolved placeholders, sending anonymously", request.uri);
                }
                resolved
            }
        };

        let auth_header = match resolved.as_ref().map(|c| (c, c.basic_auth())) {
            None => return self.transport.send(request).await,
            Some((credentials, None)) => {
                debug!("credentials of user {} for {} can not be sent as a header, sending anonymously", credentials.username, request.uri);
                return self.transport.send(request).await;
            }
            Some((_, Some(auth_header))) => auth_header,
        };

        let authenticated = request.clone()
            .with_header(AUTHORIZATION, auth_header);
        let response = self.transport.send(&authenticated).await?;

        if response.status == StatusCode::UNAUTHORIZED || response.status == StatusCode::FORBIDDEN {
            debug!("{} rejected credentials ({}), retrying anonymously", request.uri, response.status);
            return self.transport.send(request).await;
        }
        Ok(response)
    }
}
