use std::sync::Arc;

use async_trait::async_trait;
use hyper::StatusCode;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::maven::credentials::CredentialNegotiator;
use crate::maven::repo::{FetchError, MavenRepo};
use crate::maven::repository::RepositoryDescriptor;
use crate::util::blob::Blob;
use crate::util::checksum::announced_checksums;
use crate::util::http_transport::HttpRequest;

lazy_static! {
    /// relative links to sub directories in an HTML directory index, e.g. href="1.0.0/"
    static ref DIRECTORY_LINK_REGEX: Regex = Regex::new(r#"href="([^"/?#:]+)/""#).unwrap();
}

pub struct RemoteMavenRepo {
    descriptor: RepositoryDescriptor,
    negotiator: Arc<CredentialNegotiator>,
    base_uri: String, // with trailing '/'
}
impl RemoteMavenRepo {
    pub fn new(descriptor: RepositoryDescriptor, negotiator: Arc<CredentialNegotiator>) -> RemoteMavenRepo {
        let mut base_uri = descriptor.uri.clone();
        if !base_uri.ends_with('/') {
            base_uri.push('/');
        }

        RemoteMavenRepo {
            descriptor,
            negotiator,
            base_uri,
        }
    }
}

#[async_trait]
impl MavenRepo for RemoteMavenRepo {
    fn descriptor(&self) -> &RepositoryDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, path: &str) -> Result<Option<Blob>, FetchError> {
        let request = HttpRequest::get(format!("{}{}", self.base_uri, path));
        trace!("getting {}", request.uri);

        let response = self.negotiator
            .send_with_credentials(&request, self.descriptor.credentials().as_ref())
            .await?;

        if response.status.is_success() {
            let (sha1, md5) = announced_checksums(&response.headers);
            Ok(Some(Blob {
                data: response.body,
                md5,
                sha1,
            }))
        }
        else if response.status == StatusCode::NOT_FOUND || response.status == StatusCode::GONE {
            Ok(None)
        }
        else {
            Err(FetchError::Status(response.status))
        }
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<String>, FetchError> {
        let index_path = format!("{}/", path.trim_end_matches('/'));
        match self.fetch(&index_path).await? {
            None => Ok(vec![]),
            Some(blob) => Ok(parse_directory_index(&String::from_utf8_lossy(&blob.data))),
        }
    }
}

fn parse_directory_index(html: &str) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for captures in DIRECTORY_LINK_REGEX.captures_iter(html) {
        let name = &captures[1];
        if name == "." || name == ".." || result.iter().any(|n| n == name) {
            continue;
        }
        result.push(name.to_string());
    }
    result
}
