use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::StatusCode;
use thiserror::Error;

use crate::maven::credentials::CredentialNegotiator;
use crate::maven::local_repo::LocalMavenRepo;
use crate::maven::remote_repo::RemoteMavenRepo;
use crate::maven::repository::RepositoryDescriptor;
use crate::util::blob::Blob;
use crate::util::http_transport::TransportError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to read {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Read access to a Maven repository, regardless of where its files are actually stored
#[async_trait]
pub trait MavenRepo: Send + Sync {
    fn descriptor(&self) -> &RepositoryDescriptor;

    /// `path` is relative to the repository root. `None` means there is no such file.
    async fn fetch(&self, path: &str) -> Result<Option<Blob>, FetchError>;

    /// The names of the sub directories of a directory, empty if the directory does not exist
    async fn list_directory(&self, path: &str) -> Result<Vec<String>, FetchError>;

    fn uri(&self) -> &str {
        &self.descriptor().uri
    }
}

pub fn open_repo(descriptor: RepositoryDescriptor, negotiator: &Arc<CredentialNegotiator>) -> Box<dyn MavenRepo> {
    match descriptor.local_path() {
        Some(root) => Box::new(LocalMavenRepo::new(descriptor, root)),
        None => Box::new(RemoteMavenRepo::new(descriptor, negotiator.clone())),
    }
}
