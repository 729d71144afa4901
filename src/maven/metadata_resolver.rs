use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::maven::coordinates::GroupArtifact;
use crate::maven::maven_repo_metadata::MavenMetadata;
use crate::maven::paths::{artifact_directory, metadata_path, LOCAL_METADATA_FILE_NAME, METADATA_FILE_NAME};
use crate::maven::repo::{FetchError, MavenRepo};
use crate::util::compute_once::ComputeOnceCache;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MetadataKey {
    pub repository_uri: String,
    pub group_artifact: GroupArtifact,
    /// set for the per-version metadata of snapshots
    pub version_directory: Option<String>,
}

pub type MetadataCache = ComputeOnceCache<MetadataKey, Option<MavenMetadata>>;

pub struct MetadataResolver {
    cache: Arc<MetadataCache>,
}
impl MetadataResolver {
    pub fn new(cache: Arc<MetadataCache>) -> MetadataResolver {
        MetadataResolver {
            cache,
        }
    }

    /// Fetches maven-metadata.xml. Missing, unreachable or broken metadata is treated as absent.
    pub async fn fetch_remote(&self, repo: &dyn MavenRepo, group_artifact: &GroupArtifact, version_directory: Option<&str>) -> Option<MavenMetadata> {
        self.fetch_document(repo, &metadata_path(group_artifact, version_directory, METADATA_FILE_NAME)).await
    }

    /// Synthesizes release line metadata from the version directories a repository lists: sub
    ///  directories on the file system, or the HTML directory index of a remote repository
    pub async fn derive_from_listing(&self, repo: &dyn MavenRepo, group_artifact: &GroupArtifact) -> Result<MavenMetadata, FetchError> {
        let versions = repo.list_directory(&artifact_directory(group_artifact)).await?;
        trace!("derived versions {:?} for {} from {}", versions, group_artifact, repo.uri());
        Ok(MavenMetadata::derived(group_artifact, versions))
    }

    /// A repository's metadata for an artifact, computed once per execution
    pub async fn resolve(&self, repo: &dyn MavenRepo, group_artifact: &GroupArtifact, version_directory: Option<&str>) -> Option<MavenMetadata> {
        let key = MetadataKey {
            repository_uri: repo.uri().to_string(),
            group_artifact: group_artifact.clone(),
            version_directory: version_directory.map(|s| s.to_string()),
        };
        self.cache
            .get_or_compute(key, || self.do_resolve(repo, group_artifact, version_directory))
            .await
    }

    /// Folds the metadata of all repositories, in the order given
    pub async fn resolve_merged(&self, repos: &[&dyn MavenRepo], group_artifact: &GroupArtifact, version_directory: Option<&str>) -> Option<MavenMetadata> {
        let mut merged: Option<MavenMetadata> = None;
        for repo in repos {
            if let Some(metadata) = self.resolve(*repo, group_artifact, version_directory).await {
                merged = Some(match merged {
                    None => metadata,
                    Some(so_far) => so_far.merge(metadata),
                });
            }
        }
        merged
    }

    async fn do_resolve(&self, repo: &dyn MavenRepo, group_artifact: &GroupArtifact, version_directory: Option<&str>) -> Option<MavenMetadata> {
        let descriptor = repo.descriptor();

        let mut found = None;
        if descriptor.is_local() {
            found = self.fetch_document(repo, &metadata_path(group_artifact, version_directory, LOCAL_METADATA_FILE_NAME)).await;
        }
        if found.is_none() {
            found = self.fetch_remote(repo, group_artifact, version_directory).await;
        }

        // a directory listing says nothing about snapshot builds
        if found.is_some() || !descriptor.derive_metadata_if_missing || version_directory.is_some() {
            return found;
        }

        match self.derive_from_listing(repo, group_artifact).await {
            Ok(metadata) if !metadata.versioning.versions.is_empty() => Some(metadata),
            Ok(_) => None,
            Err(e) => {
                debug!("could not derive metadata for {} from {}: {}", group_artifact, repo.uri(), e);
                None
            }
        }
    }

    async fn fetch_document(&self, repo: &dyn MavenRepo, path: &str) -> Option<MavenMetadata> {
        match repo.fetch(path).await {
            Ok(Some(blob)) if blob.data.is_empty() => {
                debug!("ignoring empty metadata {} in {}", path, repo.uri());
                None
            }
            Ok(Some(blob)) => match MavenMetadata::parse(&blob.data) {
                Ok(metadata) => Some(metadata),
                Err(e) => {
                    warn!("ignoring unparseable metadata {} in {}: {}", path, repo.uri(), e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!("no metadata {} from {}: {}", path, repo.uri(), e);
                None
            }
        }
    }
}
