use std::fmt::{Display, Formatter};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TIMESTAMPED_SNAPSHOT_REGEX: Regex = Regex::new(r"^(.+)-(\d{8}\.\d{6})-(\d+)$").unwrap();
}

pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub enum MavenVersion {
    Release(String),
    /// floating snapshot, ending in '-SNAPSHOT'
    Snapshot(String),
    /// a concrete snapshot build, e.g. 2020.0.2-20210127.131051-2
    TimestampedSnapshot {
        base: String,
        timestamp: String,
        build_number: u32,
    },
}
impl MavenVersion {
    pub fn parse(version: &str) -> MavenVersion {
        if version.ends_with(SNAPSHOT_SUFFIX) {
            return MavenVersion::Snapshot(version.to_string());
        }

        if let Some(captures) = TIMESTAMPED_SNAPSHOT_REGEX.captures(version) {
            if let Ok(build_number) = captures[3].parse::<u32>() {
                return MavenVersion::TimestampedSnapshot {
                    base: captures[1].to_string(),
                    timestamp: captures[2].to_string(),
                    build_number,
                };
            }
        }

        MavenVersion::Release(version.to_string())
    }

    pub fn is_snapshot(&self) -> bool {
        !matches!(self, MavenVersion::Release(_))
    }

    /// The name of the version's directory inside a repository. Both flavors of snapshot live in
    ///  the '-SNAPSHOT' directory.
    pub fn directory(&self) -> String {
        match self {
            MavenVersion::Release(v) => v.clone(),
            MavenVersion::Snapshot(v) => v.clone(),
            MavenVersion::TimestampedSnapshot { base, .. } => format!("{}{}", base, SNAPSHOT_SUFFIX),
        }
    }

    /// The version without its '-SNAPSHOT' suffix or build identity
    pub fn base(&self) -> &str {
        match self {
            MavenVersion::Release(v) => v,
            MavenVersion::Snapshot(v) => v.strip_suffix(SNAPSHOT_SUFFIX).unwrap_or(v),
            MavenVersion::TimestampedSnapshot { base, .. } => base,
        }
    }
}
impl Display for MavenVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MavenVersion::Release(v) | MavenVersion::Snapshot(v) => write!(f, "{}", v),
            MavenVersion::TimestampedSnapshot { base, timestamp, build_number } =>
                write!(f, "{}-{}-{}", base, timestamp, build_number),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct MavenArtifactId(pub String);

#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct MavenGroupId(pub String);

#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct GroupArtifact {
    pub group_id: MavenGroupId,
    pub artifact_id: MavenArtifactId,
}
impl GroupArtifact {
    pub fn new(group_id: &str, artifact_id: &str) -> GroupArtifact {
        GroupArtifact {
            group_id: MavenGroupId(group_id.to_string()),
            artifact_id: MavenArtifactId(artifact_id.to_string()),
        }
    }
}
impl Display for GroupArtifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group_id.0, self.artifact_id.0)
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct MavenCoordinates {
    pub group_id: MavenGroupId,
    pub artifact_id: MavenArtifactId,
    pub version: MavenVersion,
}
impl MavenCoordinates {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> MavenCoordinates {
        MavenCoordinates {
            group_id: MavenGroupId(group_id.to_string()),
            artifact_id: MavenArtifactId(artifact_id.to_string()),
            version: MavenVersion::parse(version),
        }
    }

    pub fn group_artifact(&self) -> GroupArtifact {
        GroupArtifact {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
        }
    }
}
impl Display for MavenCoordinates {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id.0, self.artifact_id.0, self.version)
    }
}

/// Where an artifact has moved to. Parts that are not set keep the original's value.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Relocation {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}
impl Relocation {
    pub fn apply(&self, coordinates: &MavenCoordinates) -> MavenCoordinates {
        MavenCoordinates {
            group_id: self.group_id.clone()
                .map(MavenGroupId)
                .unwrap_or_else(|| coordinates.group_id.clone()),
            artifact_id: self.artifact_id.clone()
                .map(MavenArtifactId)
                .unwrap_or_else(|| coordinates.artifact_id.clone()),
            version: self.version.as_deref()
                .map(MavenVersion::parse)
                .unwrap_or_else(|| coordinates.version.clone()),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub enum MavenClassifier {
    Unclassified,
    Classified(String),
}
impl MavenClassifier {
    pub fn as_option(&self) -> Option<&str> {
        match self {
            MavenClassifier::Unclassified => None,
            MavenClassifier::Classified(c) => Some(c),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct MavenArtifactRef {
    pub coordinates: MavenCoordinates,
    pub classifier: MavenClassifier,
    /// without leading '.', e.g. "jar" or "pom.asc"
    pub file_extension: String,
}
impl MavenArtifactRef {
    pub fn pom(coordinates: MavenCoordinates) -> MavenArtifactRef {
        MavenArtifactRef {
            coordinates,
            classifier: MavenClassifier::Unclassified,
            file_extension: "pom".to_string(),
        }
    }

    pub fn is_pom(&self) -> bool {
        self.classifier == MavenClassifier::Unclassified && self.file_extension == "pom"
    }
}
