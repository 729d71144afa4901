mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hyper::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use maven_resolver::util::http_transport::{HttpRequest, HttpTransport, TransportError, TransportSettings};

use common::*;

fn settings() -> TransportSettings {
    TransportSettings {
        read_timeout: Duration::from_millis(300),
        retry_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

/// Reads (the beginning of) a request and returns the number of requests received so far
async fn read_request(socket: &mut tokio::net::TcpStream, counter: &AtomicUsize) -> usize {
    let mut buf = [0u8; 4096];
    let _ = socket.read(&mut buf).await;
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

const OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\nbody";

#[tokio::test]
async fn test_retry_after_dropped_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));

    let counter = requests.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            if read_request(&mut socket, &counter).await == 1 {
                // close without sending a response
                drop(socket);
            }
            else {
                socket.write_all(OK_RESPONSE).await.unwrap();
            }
        }
    });

    let transport = HttpTransport::new(settings());
    let response = transport.send(&HttpRequest::get(format!("http://{}/", addr))).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"body");
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retry_after_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));

    let counter = requests.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            if read_request(&mut socket, &counter).await == 1 {
                // keep the connection open without answering
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    drop(socket);
                });
            }
            else {
                socket.write_all(OK_RESPONSE).await.unwrap();
            }
        }
    });

    let transport = HttpTransport::new(settings());
    let response = transport.send(&HttpRequest::get(format!("http://{}/", addr))).await.unwrap();

    assert_eq!(&response.body[..], b"body");
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));

    let counter = requests.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket, &counter).await;
        }
    });

    let transport = HttpTransport::new(settings());
    let error = transport.send(&HttpRequest::get(format!("http://{}/", addr))).await.unwrap_err();

    assert!(matches!(error, TransportError::RetriesExhausted { attempts: 2, .. }));
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_error_status_is_not_retried() {
    let repo = MockRepository::answering(StatusCode::INTERNAL_SERVER_ERROR, "oops");

    let transport = HttpTransport::new(settings());
    let response = transport.send(&HttpRequest::get(repo.uri())).await.unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&response.body[..], b"oops");
    assert_eq!(repo.requests().len(), 1);
}

#[tokio::test]
async fn test_refused_connection_is_terminal() {
    let transport = HttpTransport::new(settings());
    let error = transport.send(&HttpRequest::get(format!("http://127.0.0.1:{}/", unused_port()))).await.unwrap_err();

    assert!(matches!(error, TransportError::Connect { .. }));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_head_request() {
    let repo = MockRepository::answering(StatusCode::OK, "");

    let transport = HttpTransport::new(settings());
    transport.send(&HttpRequest::head(repo.uri())).await.unwrap();

    assert_eq!(repo.requests()[0].method, hyper::Method::HEAD);
}
