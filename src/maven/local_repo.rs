use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::{read, read_dir};
use tracing::trace;

use crate::maven::repo::{FetchError, MavenRepo};
use crate::maven::repository::RepositoryDescriptor;
use crate::util::blob::Blob;

/// A repository in the local file system, e.g. ~/.m2/repository
pub struct LocalMavenRepo {
    descriptor: RepositoryDescriptor,
    root: PathBuf,
}
impl LocalMavenRepo {
    pub fn new(descriptor: RepositoryDescriptor, root: PathBuf) -> LocalMavenRepo {
        LocalMavenRepo {
            descriptor,
            root,
        }
    }
}

#[async_trait]
impl MavenRepo for LocalMavenRepo {
    fn descriptor(&self) -> &RepositoryDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, path: &str) -> Result<Option<Blob>, FetchError> {
        let file_path = self.root.join(path);
        trace!("reading {}", file_path.display());

        match read(&file_path).await {
            Ok(data) => Ok(Some(Blob::new(Bytes::from(data)))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetchError::Io { path: file_path, source: e }),
        }
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<String>, FetchError> {
        let dir_path = self.root.join(path);
        let io_error = |source| FetchError::Io { path: dir_path.clone(), source };

        let mut entries = match read_dir(&dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(io_error(e)),
        };

        let mut result = Vec::new();
        loop {
            match entries.next_entry().await.map_err(io_error)? {
                Some(dir_entry) => {
                    if !dir_entry.file_type().await.map_err(io_error)?.is_dir() {
                        continue;
                    }
                    if let Some(name) = dir_entry.file_name().to_str() {
                        result.push(name.to_string());
                    }
                }
                None => {
                    break;
                }
            }
        }

        result.sort();
        Ok(result)
    }
}
