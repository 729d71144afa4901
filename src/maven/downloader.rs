use std::fmt::Write;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::ResolverConfig;
use crate::maven::artifact_validation::validate;
use crate::maven::coordinates::{GroupArtifact, MavenArtifactRef, MavenCoordinates, MavenVersion, Relocation};
use crate::maven::credentials::CredentialNegotiator;
use crate::maven::maven_repo_metadata::MavenMetadata;
use crate::maven::metadata_resolver::{MetadataCache, MetadataResolver};
use crate::maven::normalizer::{NormalizationCache, RepositoryNormalizer};
use crate::maven::paths::{as_maven_path, maven_file_name};
use crate::maven::repo::{open_repo, MavenRepo};
use crate::maven::repository::RepositoryDescriptor;
use crate::util::http_transport::HttpTransport;

/// State shared by all resolutions of one execution. Clones share the same caches.
#[derive(Clone, Default)]
pub struct ResolutionCaches {
    pub normalized: Arc<NormalizationCache>,
    pub metadata: Arc<MetadataCache>,
}

#[derive(Clone, Debug)]
pub struct ResolvedArtifact {
    pub coordinates: MavenCoordinates,
    /// where the artifact was found
    pub repository: RepositoryDescriptor,
    pub content: Bytes,
    /// with snapshot versions expanded to the concrete build
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedAttempt {
    pub repository_uri: String,
    pub reason: String,
}

#[derive(Debug, Error)]
#[error("unable to download {target}: {}", describe_attempts(.attempts))]
pub struct DownloadError {
    pub target: String,
    pub attempts: Vec<FailedAttempt>,
}

fn describe_attempts(attempts: &[FailedAttempt]) -> String {
    if attempts.is_empty() {
        return "no repositories available".to_string();
    }

    let mut result = String::new();
    for (i, attempt) in attempts.iter().enumerate() {
        if i > 0 {
            result.push_str("; ");
        }
        let _ = write!(result, "{} ({})", attempt.repository_uri, attempt.reason);
    }
    result
}

const UNUSABLE_REPOSITORY: &str = "repository is unreachable or not allowed";

/// Dropped repositories only show up in a failure if no repository at all was usable
#[derive(Default)]
struct Candidates {
    usable: Vec<Box<dyn MavenRepo>>,
    dropped: Vec<FailedAttempt>,
}

/// Finds artifacts in an ordered list of repositories. Repositories are tried one at a time, and
///  the first one that has a valid copy wins.
pub struct ArtifactDownloader {
    negotiator: Arc<CredentialNegotiator>,
    normalizer: RepositoryNormalizer,
    metadata: MetadataResolver,
    local_repository: Option<RepositoryDescriptor>,
}
impl ArtifactDownloader {
    pub fn new(config: &ResolverConfig, caches: ResolutionCaches) -> ArtifactDownloader {
        let transport = Arc::new(HttpTransport::new(config.transport_settings()));
        let negotiator = Arc::new(CredentialNegotiator::new(transport));

        ArtifactDownloader {
            normalizer: RepositoryNormalizer::new(negotiator.clone(), config.host_policy(), caches.normalized),
            metadata: MetadataResolver::new(caches.metadata),
            local_repository: config.local_repository.clone(),
            negotiator,
        }
    }

    /// Downloads the POM for a set of coordinates, following the relocation if there is one
    pub async fn download(&self,
                          coordinates: &MavenCoordinates,
                          relocation: Option<&Relocation>,
                          repository_override: Option<&RepositoryDescriptor>,
                          repositories: &[RepositoryDescriptor],
    ) -> Result<ResolvedArtifact, DownloadError> {
        let coordinates = match relocation {
            Some(relocation) => {
                let relocated = relocation.apply(coordinates);
                debug!("{} is relocated to {}", coordinates, relocated);
                relocated
            }
            None => coordinates.clone(),
        };

        self.download_artifact(&MavenArtifactRef::pom(coordinates), repository_override, repositories).await
    }

    pub async fn download_artifact(&self,
                                   artifact_ref: &MavenArtifactRef,
                                   repository_override: Option<&RepositoryDescriptor>,
                                   repositories: &[RepositoryDescriptor],
    ) -> Result<ResolvedArtifact, DownloadError> {
        let Candidates { usable, dropped } = self.candidates(repository_override, repositories).await;
        let version = &artifact_ref.coordinates.version;
        let file_version = self.file_version(artifact_ref, &usable).await;

        if usable.is_empty() {
            return Err(DownloadError {
                target: maven_file_name(artifact_ref, &file_version),
                attempts: dropped,
            });
        }

        let mut attempts = Vec::new();
        for repo in &usable {
            if !repo.descriptor().accepts(version) {
                let reason = if version.is_snapshot() { "snapshots are disabled" } else { "releases are disabled" };
                attempts.push(FailedAttempt { repository_uri: repo.uri().to_string(), reason: reason.to_string() });
                continue;
            }

            match self.try_repository(repo.as_ref(), artifact_ref, &file_version).await {
                Ok(resolved) => {
                    debug!("resolved {} from {}", resolved.file_name, repo.uri());
                    return Ok(resolved);
                }
                Err(reason) => {
                    debug!("{} is not available from {}: {}", artifact_ref.coordinates, repo.uri(), reason);
                    attempts.push(FailedAttempt { repository_uri: repo.uri().to_string(), reason });
                }
            }
        }

        Err(DownloadError {
            target: maven_file_name(artifact_ref, &file_version),
            attempts,
        })
    }

    /// The release line metadata of all candidate repositories, merged in priority order
    pub async fn download_metadata(&self,
                                   group_artifact: &GroupArtifact,
                                   repository_override: Option<&RepositoryDescriptor>,
                                   repositories: &[RepositoryDescriptor],
    ) -> Option<MavenMetadata> {
        let candidates = self.candidates(repository_override, repositories).await;
        let repos: Vec<&dyn MavenRepo> = candidates.usable.iter()
            .map(|r| r.as_ref())
            .collect();
        self.metadata.resolve_merged(&repos, group_artifact, None).await
    }

    /// The local repository, the override and the given repositories, in this order, without
    ///  duplicates. Repositories that can not be used are set aside with the reason.
    async fn candidates(&self, repository_override: Option<&RepositoryDescriptor>, repositories: &[RepositoryDescriptor]) -> Candidates {
        let mut result = Candidates::default();

        for descriptor in self.local_repository.iter().chain(repository_override).chain(repositories) {
            let normalized = match self.normalizer.normalize(descriptor).await {
                Some(normalized) => normalized,
                None => {
                    debug!("dropping repository {} at {}", descriptor.id, descriptor.uri);
                    result.dropped.push(FailedAttempt {
                        repository_uri: descriptor.uri.trim().to_string(),
                        reason: UNUSABLE_REPOSITORY.to_string(),
                    });
                    continue;
                }
            };

            if result.usable.iter().any(|r| r.uri() == normalized.uri) {
                trace!("repository {} duplicates {}", normalized.id, normalized.uri);
                continue;
            }
            result.usable.push(open_repo(normalized, &self.negotiator));
        }
        result
    }

    /// The version as it appears in the artifact's file name. For floating snapshots, this is the
    ///  newest build any repository knows about, or the '-SNAPSHOT' version if none does.
    async fn file_version(&self, artifact_ref: &MavenArtifactRef, candidates: &[Box<dyn MavenRepo>]) -> String {
        let version = &artifact_ref.coordinates.version;
        if !matches!(version, MavenVersion::Snapshot(_)) {
            return version.to_string();
        }

        let snapshot_repos: Vec<&dyn MavenRepo> = candidates.iter()
            .filter(|r| r.descriptor().snapshots_enabled)
            .map(|r| r.as_ref())
            .collect();

        let group_artifact = artifact_ref.coordinates.group_artifact();
        let resolved = self.metadata
            .resolve_merged(&snapshot_repos, &group_artifact, Some(&version.directory()))
            .await
            .and_then(|metadata| metadata.snapshot_file_version(version, &artifact_ref.file_extension, artifact_ref.classifier.as_option()));

        match resolved {
            Some(file_version) => {
                trace!("{} resolves to {}", artifact_ref.coordinates, file_version);
                file_version
            }
            None => {
                debug!("no snapshot metadata for {}, requesting the snapshot version as is", artifact_ref.coordinates);
                version.to_string()
            }
        }
    }

    async fn try_repository(&self, repo: &dyn MavenRepo, artifact_ref: &MavenArtifactRef, file_version: &str) -> Result<ResolvedArtifact, String> {
        let version = &artifact_ref.coordinates.version;
        let mut file_version = file_version.to_string();

        let mut blob = repo.fetch(&as_maven_path(artifact_ref, &file_version)).await
            .map_err(|e| e.to_string())?;

        // a local repository holds snapshots that were installed rather than downloaded under
        //  their '-SNAPSHOT' name
        let literal = version.directory();
        if blob.is_none() && repo.descriptor().is_local() && version.is_snapshot() && file_version != literal {
            trace!("{} not found in {}, trying {}", file_version, repo.uri(), literal);
            blob = repo.fetch(&as_maven_path(artifact_ref, &literal)).await
                .map_err(|e| e.to_string())?;
            file_version = literal;
        }

        let blob = blob.ok_or_else(|| "not found".to_string())?;
        validate(repo, artifact_ref, &file_version, &blob).await
            .map_err(|e| e.to_string())?;

        Ok(ResolvedArtifact {
            coordinates: artifact_ref.coordinates.clone(),
            repository: repo.descriptor().clone(),
            content: blob.data,
            file_name: maven_file_name(artifact_ref, &file_version),
        })
    }
}
