use thiserror::Error;
use tracing::trace;

use crate::maven::coordinates::{MavenArtifactRef, MavenClassifier};
use crate::maven::metadata_xml::{parse_project, Project};
use crate::maven::paths::as_maven_path;
use crate::maven::repo::{FetchError, MavenRepo};
use crate::util::blob::Blob;

#[derive(Debug, Error)]
pub enum InvalidArtifact {
    #[error("{0} is empty")]
    Empty(String),
    #[error("{algorithm} checksum mismatch for {path}")]
    ChecksumMismatch { path: String, algorithm: &'static str },
    #[error("{path} is not a valid POM: {reason}")]
    Malformed { path: String, reason: String },
    #[error("companion artifact {0} is missing")]
    MissingCompanion(String),
    #[error("companion artifact {0} is empty")]
    EmptyCompanion(String),
    #[error("could not read companion artifact {path}: {source}")]
    CompanionUnreadable { path: String, source: FetchError },
}

/// The extension of the binary that a POM with the given packaging is published with, if any
pub fn companion_extension(packaging: Option<&str>) -> Option<&'static str> {
    match packaging.map(|p| p.trim()) {
        None | Some("") | Some("jar") | Some("bundle") | Some("maven-plugin") => Some("jar"),
        Some("war") => Some("war"),
        _ => None,
    }
}

/// Checks that content fetched from a repository is usable. For POMs in file system repositories,
///  this includes the binary next to it: a local repository often holds a POM whose jar was
///  never downloaded.
pub async fn validate(repo: &dyn MavenRepo, artifact_ref: &MavenArtifactRef, file_version: &str, blob: &Blob) -> Result<(), InvalidArtifact> {
    let path = as_maven_path(artifact_ref, file_version);

    if blob.data.is_empty() {
        return Err(InvalidArtifact::Empty(path));
    }
    if let Err(algorithm) = blob.verify() {
        return Err(InvalidArtifact::ChecksumMismatch { path, algorithm });
    }

    if !artifact_ref.is_pom() {
        return Ok(());
    }

    let project = parse_pom(&path, blob)?;

    if repo.descriptor().is_local() {
        if let Some(extension) = companion_extension(project.packaging.as_deref()) {
            let companion = MavenArtifactRef {
                coordinates: artifact_ref.coordinates.clone(),
                classifier: MavenClassifier::Unclassified,
                file_extension: extension.to_string(),
            };
            validate_companion(repo, &as_maven_path(&companion, file_version)).await?;
        }
    }
    Ok(())
}

fn parse_pom(path: &str, blob: &Blob) -> Result<Project, InvalidArtifact> {
    let project = parse_project(&blob.data)
        .map_err(|e| InvalidArtifact::Malformed { path: path.to_string(), reason: e.to_string() })?;

    if project.artifactId.is_none() && project.parent.is_none() {
        return Err(InvalidArtifact::Malformed {
            path: path.to_string(),
            reason: "neither artifactId nor parent".to_string(),
        });
    }
    Ok(project)
}

async fn validate_companion(repo: &dyn MavenRepo, path: &str) -> Result<(), InvalidArtifact> {
    trace!("checking companion {} in {}", path, repo.uri());

    match repo.fetch(path).await {
        Ok(Some(blob)) if blob.data.is_empty() => Err(InvalidArtifact::EmptyCompanion(path.to_string())),
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(InvalidArtifact::MissingCompanion(path.to_string())),
        Err(source) => Err(InvalidArtifact::CompanionUnreadable { path: path.to_string(), source }),
    }
}
