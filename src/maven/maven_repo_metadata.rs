use std::collections::HashSet;

use serde::Serialize;

use crate::maven::coordinates::{GroupArtifact, MavenVersion};
use crate::maven::metadata_xml;


/// A cleaned-up version of the maven-metadata.xml file format described at
///  https://maven.apache.org/ref/3.9.5/maven-repository-metadata/repository-metadata.html
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MavenMetadata {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub versioning: Versioning,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Versioning {
    pub latest: Option<String>,
    pub release: Option<String>,
    /// no duplicates, in document order
    pub versions: Vec<String>,
    pub snapshot: Option<Snapshot>,
    pub snapshot_versions: Vec<SnapshotVersion>,
    /// yyyyMMddHHmmss
    pub last_updated: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// yyyyMMdd.HHmmss
    pub timestamp: String,
    pub build_number: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SnapshotVersion {
    pub classifier: Option<String>,
    pub extension: String,
    pub value: String,
    pub updated: Option<String>,
}

impl MavenMetadata {
    pub fn parse(data: &[u8]) -> anyhow::Result<MavenMetadata> {
        Ok(metadata_xml::parse_metadata(data)?.into())
    }

    /// Metadata synthesized from a directory listing: nothing but the list of versions
    pub fn derived(group_artifact: &GroupArtifact, versions: Vec<String>) -> MavenMetadata {
        MavenMetadata {
            group_id: group_artifact.group_id.0.clone(),
            artifact_id: group_artifact.artifact_id.0.clone(),
            version: None,
            versioning: Versioning {
                versions: dedup(versions),
                ..Default::default()
            },
        }
    }

    /// Combines metadata for the same group and artifact from two repositories. `self` takes
    ///  precedence wherever the two can not be combined.
    pub fn merge(self, other: MavenMetadata) -> MavenMetadata {
        let a = self.versioning;
        let b = other.versioning;

        let mut versions = a.versions;
        versions.extend(b.versions);

        let snapshot = match (a.snapshot, b.snapshot) {
            (Some(mine), Some(theirs)) => {
                if theirs.timestamp > mine.timestamp { Some(theirs) } else { Some(mine) }
            }
            (mine, theirs) => mine.or(theirs),
        };

        let mut snapshot_versions = a.snapshot_versions;
        for snapshot_version in b.snapshot_versions {
            if !snapshot_versions.contains(&snapshot_version) {
                snapshot_versions.push(snapshot_version);
            }
        }

        MavenMetadata {
            group_id: self.group_id,
            artifact_id: self.artifact_id,
            version: self.version.or(other.version),
            versioning: Versioning {
                latest: a.latest.or(b.latest),
                release: a.release.or(b.release),
                versions: dedup(versions),
                snapshot,
                snapshot_versions,
                last_updated: a.last_updated.max(b.last_updated),
            },
        }
    }

    /// The version string that appears in the file name of the given snapshot file, e.g.
    ///  "2.10.0-20220201.001946-85".
    pub fn snapshot_file_version(&self, version: &MavenVersion, extension: &str, classifier: Option<&str>) -> Option<String> {
        let from_snapshot = self.versioning.snapshot.as_ref()
            .and_then(|s| s.build_number.map(|build_number| format!("{}-{}-{}", version.base(), s.timestamp, build_number)));

        // merged documents can list several builds for the same file: the latest deployment wins,
        //  and on equal timestamps the one that agrees with the snapshot block
        let from_snapshot_versions = self.versioning.snapshot_versions.iter()
            .filter(|v| v.extension == extension && v.classifier.as_deref() == classifier)
            .max_by_key(|v| (v.updated.clone(), Some(&v.value) == from_snapshot.as_ref()))
            .map(|v| v.value.clone());

        from_snapshot_versions.or(from_snapshot)
    }
}

fn dedup(versions: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    versions.into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

impl From<metadata_xml::Metadata> for MavenMetadata {
    fn from(xml: metadata_xml::Metadata) -> Self {
        let versioning = xml.versioning.unwrap_or_default();

        MavenMetadata {
            group_id: xml.groupId.unwrap_or_default(),
            artifact_id: xml.artifactId.unwrap_or_default(),
            version: xml.version,
            versioning: Versioning {
                latest: versioning.latest,
                release: versioning.release,
                versions: dedup(versioning.versions.map(|v| v.version).unwrap_or_default()),
                // a snapshot block without a timestamp carries no build identity
                snapshot: versioning.snapshot.and_then(|s| {
                    s.timestamp.map(|timestamp| Snapshot {
                        timestamp,
                        build_number: s.buildNumber,
                    })
                }),
                snapshot_versions: versioning.snapshotVersions
                    .map(|v| v.snapshotVersion)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|v| SnapshotVersion {
                        classifier: v.classifier,
                        extension: v.extension,
                        value: v.value,
                        updated: v.updated,
                    })
                    .collect(),
                last_updated: versioning.lastUpdated,
            },
        }
    }
}
