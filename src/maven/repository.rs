use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::maven::coordinates::MavenVersion;
use crate::maven::credentials::Credentials;

fn enabled() -> bool {
    true
}

/// Where and how to reach a Maven repository
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub id: String,
    pub uri: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "enabled")]
    pub snapshots_enabled: bool,
    #[serde(default = "enabled")]
    pub releases_enabled: bool,
    /// skips the reachability probe during normalization
    #[serde(default)]
    pub known_to_exist: bool,
    /// synthesize metadata from the directory structure if the repository has none
    #[serde(default)]
    pub derive_metadata_if_missing: bool,
}
impl RepositoryDescriptor {
    pub fn new(id: &str, uri: &str) -> RepositoryDescriptor {
        RepositoryDescriptor {
            id: id.to_string(),
            uri: uri.to_string(),
            username: None,
            password: None,
            snapshots_enabled: true,
            releases_enabled: true,
            known_to_exist: false,
            derive_metadata_if_missing: false,
        }
    }

    pub fn with_credentials(self, username: &str, password: &str) -> RepositoryDescriptor {
        RepositoryDescriptor {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..self
        }
    }

    pub fn with_snapshots(self, snapshots_enabled: bool) -> RepositoryDescriptor {
        RepositoryDescriptor { snapshots_enabled, ..self }
    }

    pub fn with_releases(self, releases_enabled: bool) -> RepositoryDescriptor {
        RepositoryDescriptor { releases_enabled, ..self }
    }

    pub fn with_known_to_exist(self, known_to_exist: bool) -> RepositoryDescriptor {
        RepositoryDescriptor { known_to_exist, ..self }
    }

    pub fn with_derive_metadata_if_missing(self, derive_metadata_if_missing: bool) -> RepositoryDescriptor {
        RepositoryDescriptor { derive_metadata_if_missing, ..self }
    }

    /// Credentials are only used if both parts are configured
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        }
    }

    /// The same repository with a URI that has no surrounding whitespace. Remote URIs also lose a
    ///  trailing '/', file system URIs keep it.
    pub fn canonicalized(&self) -> RepositoryDescriptor {
        let uri = self.uri.trim();
        let uri = if self.is_local() { uri } else { uri.trim_end_matches('/') };
        RepositoryDescriptor {
            uri: uri.to_string(),
            ..self.clone()
        }
    }

    pub fn is_local(&self) -> bool {
        self.uri.trim_start().starts_with("file:")
    }

    /// The directory of a file system based repository
    pub fn local_path(&self) -> Option<PathBuf> {
        if !self.is_local() {
            return None;
        }
        Url::parse(self.uri.trim()).ok()?
            .to_file_path().ok()
    }

    pub fn accepts(&self, version: &MavenVersion) -> bool {
        if version.is_snapshot() {
            self.snapshots_enabled
        }
        else {
            self.releases_enabled
        }
    }
}
