#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use axum::http::header::AUTHORIZATION;
use axum::Router;

use maven_resolver::config::ResolverConfig;

/// "Basic " + base64("user:pass")
pub const USER_PASS_AUTH: &str = "Basic dXNlcjpwYXNz";

pub const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.springframework.cloud</groupId>
    <artifactId>spring-cloud-dependencies</artifactId>
    <version>2020.0.2-SNAPSHOT</version>
    <packaging>pom</packaging>
</project>"#;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    /// without the repository's "/maven" prefix
    pub path: String,
    pub authorization: Option<String>,
}

type Dispatch = dyn Fn(&RecordedRequest) -> (StatusCode, String) + Send + Sync;

struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    dispatch: Box<Dispatch>,
}

/// An HTTP Maven repository on a loopback port that answers via a closure and records what it
///  was asked
pub struct MockRepository {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}
impl MockRepository {
    pub fn start(dispatch: impl Fn(&RecordedRequest) -> (StatusCode, String) + Send + Sync + 'static) -> MockRepository {
        let state = Arc::new(MockState {
            requests: Mutex::new(vec![]),
            dispatch: Box::new(dispatch),
        });

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .fallback(handle)
            .with_state(state.clone());
        tokio::spawn(axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service()));

        MockRepository {
            addr,
            state,
        }
    }

    /// Answers every request with the same status and body
    pub fn answering(status: StatusCode, body: &'static str) -> MockRepository {
        MockRepository::start(move |_| (status, body.to_string()))
    }

    pub fn uri(&self) -> String {
        format!("http://{}/maven", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<RecordedRequest> {
        self.requests().into_iter()
            .filter(|r| r.method == Method::GET)
            .collect()
    }
}

async fn handle(State(state): State<Arc<MockState>>, request: Request<Body>) -> (StatusCode, String) {
    let path = request.uri().path();
    let recorded = RecordedRequest {
        method: request.method().clone(),
        path: path.strip_prefix("/maven/").unwrap_or(path).to_string(),
        authorization: request.headers().get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()),
    };

    let response = (state.dispatch)(&recorded);
    state.requests.lock().unwrap().push(recorded);
    response
}

/// Allows loopback repositories and keeps timeouts short
pub fn test_config() -> ResolverConfig {
    ResolverConfig {
        allow_loopback: true,
        read_timeout_ms: 2_000,
        connect_timeout_ms: 1_000,
        retry_delay_ms: 10,
        local_repository: None,
        repositories: vec![],
        ..Default::default()
    }
}

/// A port that nothing listens on
pub fn unused_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap()
        .local_addr().unwrap()
        .port()
}
