use anyhow::anyhow;
use lazy_static::lazy_static;
use regex::Regex;
use crate::maven::coordinates::*;

lazy_static! {
    static ref TIMESTAMP_BUILD_REGEX: Regex = Regex::new(r"^(\d{8}\.\d{6})-(\d+)").unwrap();
}

pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";
pub const LOCAL_METADATA_FILE_NAME: &str = "maven-metadata-local.xml";


/// e.g. "org/springframework/boot/spring-boot"
pub fn artifact_directory(group_artifact: &GroupArtifact) -> String {
    format!(
        "{}/{}",
        group_artifact.group_id.0.replace('.', "/"),
        group_artifact.artifact_id.0,
    )
}

/// Path of a metadata file, either at the artifact level (release line) or inside a version
///  directory (snapshot builds)
pub fn metadata_path(group_artifact: &GroupArtifact, version_directory: Option<&str>, file_name: &str) -> String {
    match version_directory {
        None => format!("{}/{}", artifact_directory(group_artifact), file_name),
        Some(version) => format!("{}/{}/{}", artifact_directory(group_artifact), version, file_name),
    }
}

/// `file_version` is the version as it appears in the file name. For snapshots that is either the
///  literal '-SNAPSHOT' version or a resolved timestamped build.
pub fn as_maven_path(artifact_ref: &MavenArtifactRef, file_version: &str) -> String {
    format!(
        "{}/{}/{}",
        artifact_directory(&artifact_ref.coordinates.group_artifact()),
        artifact_ref.coordinates.version.directory(),
        maven_file_name(artifact_ref, file_version),
    )
}

pub fn maven_file_name(artifact_ref: &MavenArtifactRef, file_version: &str) -> String {
    let classifier_string = match &artifact_ref.classifier {
        MavenClassifier::Unclassified => "".to_string(),
        MavenClassifier::Classified(c) => format!("-{}", c),
    };

    format!("{}-{}{}.{}",
            artifact_ref.coordinates.artifact_id.0,
            file_version,
            classifier_string,
            artifact_ref.file_extension,
    )
}

fn parse_maven_filename<'a>(file_name: &'a str, artifact_id: &str, version_directory: &str) -> anyhow::Result<ParseFilenameResult<'a>> {
    let full_file_name = file_name;

    let file_name = file_name.strip_prefix(artifact_id)
        .and_then(|s| s.strip_prefix('-'))
        .ok_or_else(|| anyhow!("{} is not a valid maven file name: expected to start with artifact id {}", full_file_name, artifact_id))?;

    let (version, file_name) = if let Some(rest) = file_name.strip_prefix(version_directory) {
        (MavenVersion::parse(version_directory), rest)
    }
    else if let Some(base) = version_directory.strip_suffix(SNAPSHOT_SUFFIX) {
        // <artifactId>-<base>-<timestamp>-<buildNumber>[-<classifier>].<extension>
        let timestamped = file_name.strip_prefix(base)
            .and_then(|s| s.strip_prefix('-'))
            .ok_or_else(|| anyhow!("{} is not a valid maven file name: expected to have snapshot version {}", full_file_name, version_directory))?;

        let captures = TIMESTAMP_BUILD_REGEX.captures(timestamped)
            .ok_or_else(|| anyhow!("snapshot file name has neither '-SNAPSHOT' nor a timestamp: {}", full_file_name))?;
        let build_number = captures[2].parse::<u32>()?;
        let version = MavenVersion::TimestampedSnapshot {
            base: base.to_string(),
            timestamp: captures[1].to_string(),
            build_number,
        };
        (version, &timestamped[captures[0].len()..])
    }
    else {
        return Err(anyhow!("{} is not a valid maven file name: expected to have version string {}", full_file_name, version_directory));
    };

    // NB: classifiers can contain any number of '-' characters, but no '.'
    let (classifier, extension) = if let Some(rest) = file_name.strip_prefix('-') {
        match rest.find('.') {
            Some(dot) if dot > 0 => (Some(&rest[..dot]), &rest[dot+1..]),
            _ => return Err(anyhow!("not a valid maven file name - invalid classifier format: {}", full_file_name)),
        }
    }
    else if let Some(extension) = file_name.strip_prefix('.') {
        (None, extension)
    }
    else {
        return Err(anyhow!("not a valid maven file name - unexpected characters after the version: {}", full_file_name));
    };

    if extension.is_empty() {
        return Err(anyhow!("maven file name without extension: {}", full_file_name));
    }

    Ok(ParseFilenameResult {
        version,
        classifier,
        extension,
    })
}

/// path is the relative path inside a maven repository, i.e. it starts with something like
///  "org/..." or "com/..."
pub fn parse_maven_path(path: &str) -> anyhow::Result<MavenArtifactRef> {
    let path = path.trim_start_matches('/');

    if let Some((without_filename, file_name)) = path.rsplit_once('/') {
        if let Some((without_version, version)) = without_filename.rsplit_once('/') {
            if let Some((group_id, artifact_id)) = without_version.rsplit_once('/') {
                if group_id.is_empty() {
                    return Err(anyhow!("not a valid Maven artifact path (no group): {:?}", path));
                }

                let parsed_filename = parse_maven_filename(file_name, artifact_id, version)?;

                return Ok(MavenArtifactRef {
                    coordinates: MavenCoordinates {
                        group_id: MavenGroupId(group_id.replace('/', ".")),
                        artifact_id: MavenArtifactId(artifact_id.to_string()),
                        version: parsed_filename.version,
                    },
                    classifier: match parsed_filename.classifier {
                        None => MavenClassifier::Unclassified,
                        Some(s) => MavenClassifier::Classified(s.to_string()),
                    },
                    file_extension: parsed_filename.extension.to_string(),
                });
            }
        }
    }

    Err(anyhow!("not a valid Maven artifact path: {:?}", path))
}


#[derive(Debug, Eq, PartialEq)]
struct ParseFilenameResult<'a> {
    version: MavenVersion,
    classifier: Option<&'a str>,
    extension: &'a str,
}
