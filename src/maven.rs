pub mod artifact_validation;
pub mod coordinates;
pub mod credentials;
pub mod downloader;
pub mod local_repo;
pub mod maven_repo_metadata;
pub mod metadata_resolver;
pub mod metadata_xml;
pub mod normalizer;
pub mod paths;
pub mod remote_repo;
pub mod repo;
pub mod repository;

pub use coordinates::{GroupArtifact, MavenArtifactRef, MavenClassifier, MavenCoordinates, MavenVersion, Relocation};
pub use downloader::{ArtifactDownloader, DownloadError, FailedAttempt, ResolutionCaches, ResolvedArtifact};
pub use maven_repo_metadata::MavenMetadata;
pub use repository::RepositoryDescriptor;
