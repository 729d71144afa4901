mod common;

use std::fs;
use std::path::Path;

use hyper::{Method, StatusCode};
use url::Url;

use maven_resolver::config::ResolverConfig;
use maven_resolver::maven::{ArtifactDownloader, MavenCoordinates, RepositoryDescriptor, ResolutionCaches};

use common::*;

const SNAPSHOT_POM_PATH: &str = "fred/fred/2020.0.2-SNAPSHOT/fred-2020.0.2-20210127.131051-2.pom";

fn downloader() -> ArtifactDownloader {
    ArtifactDownloader::new(&test_config(), ResolutionCaches::default())
}

fn downloader_with_local(root: &Path) -> ArtifactDownloader {
    let config = ResolverConfig {
        local_repository: Some(local_descriptor(root)),
        ..test_config()
    };
    ArtifactDownloader::new(&config, ResolutionCaches::default())
}

fn local_descriptor(root: &Path) -> RepositoryDescriptor {
    RepositoryDescriptor::new("local", Url::from_directory_path(root).unwrap().as_str())
}

fn fred(version: &str) -> MavenCoordinates {
    MavenCoordinates::new("fred", "fred", version)
}

fn snapshot_metadata(timestamp: &str, build_number: u32) -> String {
    format!(r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>fred</groupId>
  <artifactId>fred</artifactId>
  <version>1.0.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>{timestamp}</timestamp>
      <buildNumber>{build_number}</buildNumber>
    </snapshot>
    <lastUpdated>20220927033510</lastUpdated>
  </versioning>
</metadata>"#)
}

/// Snapshot metadata as deployed by Maven, with a `pom` entry in `snapshotVersions`
fn deployed_snapshot_metadata(timestamp: &str, build_number: u32) -> String {
    let updated = timestamp.replace('.', "");
    format!(r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>fred</groupId>
  <artifactId>fred</artifactId>
  <version>1.0.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>{timestamp}</timestamp>
      <buildNumber>{build_number}</buildNumber>
    </snapshot>
    <lastUpdated>{updated}</lastUpdated>
    <snapshotVersions>
      <snapshotVersion>
        <extension>pom</extension>
        <value>1.0.0-{timestamp}-{build_number}</value>
        <updated>{updated}</updated>
      </snapshotVersion>
    </snapshotVersions>
  </versioning>
</metadata>"#)
}

#[tokio::test]
async fn test_sole_unreachable_repository_is_reported() {
    let uri = format!("http://127.0.0.1:{}/maven", unused_port());

    let error = downloader()
        .download(&fred("1.0.0"), None, None, &[RepositoryDescriptor::new("refused", &uri)])
        .await
        .unwrap_err();

    assert_eq!(error.attempts.len(), 1);
    assert_eq!(error.attempts[0].repository_uri, uri);
    assert!(error.to_string().contains(&uri), "{}", error);
}

#[tokio::test]
async fn test_error_statuses_from_all_repositories_are_reported() {
    let first = MockRepository::answering(StatusCode::INTERNAL_SERVER_ERROR, "");
    let second = MockRepository::answering(StatusCode::BAD_REQUEST, "");
    let repositories = vec![
        RepositoryDescriptor::new("id", &first.uri()),
        RepositoryDescriptor::new("id2", &second.uri()),
    ];

    let error = downloader().download(&fred("1.0.0"), None, None, &repositories).await.unwrap_err();

    let message = error.to_string();
    assert!(message.contains(&first.uri()), "{}", message);
    assert!(message.contains(&second.uri()), "{}", message);
    assert_eq!(error.attempts.len(), 2);
}

#[tokio::test]
async fn test_timestamped_snapshot_version_with_credentials() {
    let server = MockRepository::start(|request| {
        if request.authorization.as_deref() != Some(USER_PASS_AUTH) {
            (StatusCode::UNAUTHORIZED, String::new())
        }
        else if request.path == SNAPSHOT_POM_PATH {
            (StatusCode::OK, POM.to_string())
        }
        else {
            (StatusCode::NOT_FOUND, String::new())
        }
    });
    let repo = RepositoryDescriptor::new("id", &server.uri())
        .with_credentials("user", "pass");

    let resolved = downloader()
        .download(&fred("2020.0.2-20210127.131051-2"), None, None, &[repo])
        .await
        .unwrap();

    assert_eq!(resolved.file_name, "fred-2020.0.2-20210127.131051-2.pom");
    assert_eq!(resolved.repository.id, "id");
    assert_eq!(String::from_utf8_lossy(&resolved.content), POM);
}

#[tokio::test]
async fn test_anonymous_fallback_when_credentials_are_rejected() {
    let server = MockRepository::start(|request| {
        if request.authorization.is_some() {
            (StatusCode::UNAUTHORIZED, String::new())
        }
        else {
            (StatusCode::OK, POM.to_string())
        }
    });
    let repo = RepositoryDescriptor::new("id", &server.uri())
        .with_credentials("user", "pass");

    let resolved = downloader().download(&fred("1.0.0"), None, None, &[repo]).await.unwrap();
    assert_eq!(resolved.file_name, "fred-1.0.0.pom");

    let gets = server.gets();
    assert_eq!(gets.len(), 2);
    assert_eq!(gets[0].authorization.as_deref(), Some(USER_PASS_AUTH));
    assert_eq!(gets[1].authorization, None);
}

#[tokio::test]
async fn test_unresolved_credentials_are_never_sent() {
    let server = MockRepository::start(|request| {
        if request.authorization.is_some() {
            (StatusCode::UNAUTHORIZED, String::new())
        }
        else {
            (StatusCode::OK, POM.to_string())
        }
    });
    let repo = RepositoryDescriptor::new("id", &server.uri())
        .with_credentials("${env.ARTIFACTORY_USERNAME}", "${env.ARTIFACTORY_PASSWORD}");

    downloader().download(&fred("1.0.0"), None, None, &[repo]).await.unwrap();

    let requests = server.requests();
    assert!(!requests.is_empty());
    assert!(requests.iter().all(|r| r.authorization.is_none()));
}

#[tokio::test]
async fn test_floating_snapshot_resolved_through_merged_metadata() {
    let older = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/1.0.0-SNAPSHOT/maven-metadata.xml" => (StatusCode::OK, snapshot_metadata("20210115.042754", 180)),
        "fred/fred/1.0.0-SNAPSHOT/fred-1.0.0-20210115.042754-180.pom" => (StatusCode::OK, POM.to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let newer = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/1.0.0-SNAPSHOT/maven-metadata.xml" => (StatusCode::OK, snapshot_metadata("20220927.033510", 223)),
        "fred/fred/1.0.0-SNAPSHOT/fred-1.0.0-20220927.033510-223.pom" => (StatusCode::OK, POM.to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let repositories = vec![
        RepositoryDescriptor::new("older", &older.uri()),
        RepositoryDescriptor::new("newer", &newer.uri()),
    ];

    let resolved = downloader().download(&fred("1.0.0-SNAPSHOT"), None, None, &repositories).await.unwrap();

    assert_eq!(resolved.file_name, "fred-1.0.0-20220927.033510-223.pom");
    assert_eq!(resolved.repository.id, "newer");
}

#[tokio::test]
async fn test_latest_deployed_snapshot_wins_over_repository_order() {
    let older = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/1.0.0-SNAPSHOT/maven-metadata.xml" => (StatusCode::OK, deployed_snapshot_metadata("20210115.042754", 180)),
        "fred/fred/1.0.0-SNAPSHOT/fred-1.0.0-20210115.042754-180.pom" => (StatusCode::OK, POM.to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let newer = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/1.0.0-SNAPSHOT/maven-metadata.xml" => (StatusCode::OK, deployed_snapshot_metadata("20220927.033510", 223)),
        "fred/fred/1.0.0-SNAPSHOT/fred-1.0.0-20220927.033510-223.pom" => (StatusCode::OK, POM.to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let repositories = vec![
        RepositoryDescriptor::new("older", &older.uri()),
        RepositoryDescriptor::new("newer", &newer.uri()),
    ];

    let resolved = downloader().download(&fred("1.0.0-SNAPSHOT"), None, None, &repositories).await.unwrap();

    assert_eq!(resolved.file_name, "fred-1.0.0-20220927.033510-223.pom");
    assert_eq!(resolved.repository.id, "newer");
    assert!(older.gets().iter().all(|r| !r.path.ends_with("-180.pom")));
}

#[tokio::test]
async fn test_release_repository_metadata_is_not_used_for_snapshots() {
    let releases = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/1.0.0-SNAPSHOT/maven-metadata.xml" => (StatusCode::OK, snapshot_metadata("20220927.033510", 223)),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let snapshots = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/1.0.0-SNAPSHOT/fred-1.0.0-SNAPSHOT.pom" => (StatusCode::OK, POM.to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let repositories = vec![
        RepositoryDescriptor::new("releases", &releases.uri()).with_snapshots(false),
        RepositoryDescriptor::new("snapshots", &snapshots.uri()),
    ];

    let resolved = downloader().download(&fred("1.0.0-SNAPSHOT"), None, None, &repositories).await.unwrap();

    assert_eq!(resolved.file_name, "fred-1.0.0-SNAPSHOT.pom");
    assert!(releases.gets().is_empty());
}

#[tokio::test]
async fn test_snapshot_without_metadata_requests_literal_file() {
    let server = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/1.0.0-SNAPSHOT/fred-1.0.0-SNAPSHOT.pom" => (StatusCode::OK, POM.to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let repo = RepositoryDescriptor::new("id", &server.uri());

    let resolved = downloader().download(&fred("1.0.0-SNAPSHOT"), None, None, &[repo]).await.unwrap();
    assert_eq!(resolved.file_name, "fred-1.0.0-SNAPSHOT.pom");
}

#[tokio::test]
async fn test_first_valid_repository_wins() {
    let first = MockRepository::answering(StatusCode::OK, POM);
    let second = MockRepository::answering(StatusCode::OK, POM);
    let repositories = vec![
        RepositoryDescriptor::new("first", &first.uri()),
        RepositoryDescriptor::new("second", &second.uri()),
    ];

    let resolved = downloader().download(&fred("1.0.0"), None, None, &repositories).await.unwrap();

    assert_eq!(resolved.repository.id, "first");
    assert_eq!(first.gets().len(), 1);
    assert!(second.gets().is_empty());
}

#[tokio::test]
async fn test_override_repository_is_preferred() {
    let listed = MockRepository::answering(StatusCode::OK, POM);
    let preferred = MockRepository::answering(StatusCode::OK, POM);

    let resolved = downloader()
        .download(&fred("1.0.0"), None, Some(&RepositoryDescriptor::new("override", &preferred.uri())), &[RepositoryDescriptor::new("listed", &listed.uri())])
        .await
        .unwrap();

    assert_eq!(resolved.repository.id, "override");
    assert!(listed.gets().is_empty());
}

#[tokio::test]
async fn test_empty_content_falls_through_to_next_repository() {
    let empty = MockRepository::answering(StatusCode::OK, "");
    let valid = MockRepository::answering(StatusCode::OK, POM);
    let repositories = vec![
        RepositoryDescriptor::new("empty", &empty.uri()),
        RepositoryDescriptor::new("valid", &valid.uri()),
    ];

    let resolved = downloader().download(&fred("1.0.0"), None, None, &repositories).await.unwrap();
    assert_eq!(resolved.repository.id, "valid");
}

#[tokio::test]
async fn test_duplicate_repositories_are_tried_once() {
    let server = MockRepository::answering(StatusCode::NOT_FOUND, "");
    let repositories = vec![
        RepositoryDescriptor::new("a", &server.uri()),
        RepositoryDescriptor::new("b", &format!("{}/", server.uri())),
    ];

    let error = downloader().download(&fred("1.0.0"), None, None, &repositories).await.unwrap_err();

    assert_eq!(error.attempts.len(), 1);
    assert_eq!(error.attempts[0].reason, "not found");
    assert_eq!(server.requests().iter().filter(|r| r.method == Method::HEAD).count(), 1);
}

#[tokio::test]
async fn test_unreachable_repositories_are_dropped() {
    let valid = MockRepository::answering(StatusCode::OK, POM);
    let repositories = vec![
        RepositoryDescriptor::new("blocked", "http://0.0.0.0"),
        RepositoryDescriptor::new("refused", &format!("http://127.0.0.1:{}/maven", unused_port())),
        RepositoryDescriptor::new("valid", &valid.uri()),
    ];

    let resolved = downloader().download(&fred("1.0.0"), None, None, &repositories).await.unwrap();
    assert_eq!(resolved.repository.id, "valid");
}

#[tokio::test]
async fn test_local_pom_with_missing_jar_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let version_dir = dir.path().join("fred/fred/1.0.0");
    fs::create_dir_all(&version_dir).unwrap();
    fs::write(version_dir.join("fred-1.0.0.pom"), "<project><groupId>fred</groupId><artifactId>fred</artifactId><version>1.0.0</version></project>").unwrap();

    let error = downloader_with_local(dir.path()).download(&fred("1.0.0"), None, None, &[]).await.unwrap_err();
    assert!(error.to_string().contains("missing"), "{}", error);
}

#[tokio::test]
async fn test_local_pom_with_empty_jar_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let version_dir = dir.path().join("fred/fred/1.0.0");
    fs::create_dir_all(&version_dir).unwrap();
    fs::write(version_dir.join("fred-1.0.0.pom"), "<project><groupId>fred</groupId><artifactId>fred</artifactId><version>1.0.0</version></project>").unwrap();
    fs::write(version_dir.join("fred-1.0.0.jar"), "").unwrap();

    let error = downloader_with_local(dir.path()).download(&fred("1.0.0"), None, None, &[]).await.unwrap_err();
    assert!(error.to_string().contains("empty"), "{}", error);
}

#[tokio::test]
async fn test_local_repository_is_consulted_first() {
    let dir = tempfile::tempdir().unwrap();
    let version_dir = dir.path().join("fred/fred/1.0.0");
    fs::create_dir_all(&version_dir).unwrap();
    fs::write(version_dir.join("fred-1.0.0.pom"), "<project><groupId>fred</groupId><artifactId>fred</artifactId><version>1.0.0</version></project>").unwrap();
    fs::write(version_dir.join("fred-1.0.0.jar"), "jar").unwrap();
    let remote = MockRepository::answering(StatusCode::OK, POM);

    let resolved = downloader_with_local(dir.path())
        .download(&fred("1.0.0"), None, None, &[RepositoryDescriptor::new("remote", &remote.uri())])
        .await
        .unwrap();

    let local_uri = Url::from_directory_path(dir.path()).unwrap();
    assert!(resolved.repository.uri.starts_with(local_uri.as_str()));
    assert!(remote.gets().is_empty());
}

#[tokio::test]
async fn test_metadata_from_all_repositories_is_merged() {
    let first = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/maven-metadata.xml" => (StatusCode::OK, "<metadata><groupId>fred</groupId><artifactId>fred</artifactId><versioning><versions><version>1.0.0</version><version>1.1.0</version></versions></versioning></metadata>".to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let second = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/maven-metadata.xml" => (StatusCode::OK, "<metadata><groupId>fred</groupId><artifactId>fred</artifactId><versioning><versions><version>1.1.0</version><version>2.0.0</version></versions></versioning></metadata>".to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let repositories = vec![
        RepositoryDescriptor::new("first", &first.uri()),
        RepositoryDescriptor::new("second", &second.uri()),
    ];

    let metadata = downloader()
        .download_metadata(&maven_resolver::maven::GroupArtifact::new("fred", "fred"), None, &repositories)
        .await
        .unwrap();

    assert_eq!(metadata.versioning.versions, vec!["1.0.0", "1.1.0", "2.0.0"]);
}

#[tokio::test]
async fn test_metadata_derived_from_directory_index() {
    let server = MockRepository::start(|request| match request.path.as_str() {
        "fred/fred/" => (StatusCode::OK, r#"<html><body><a href="../">../</a><a href="1.0.0/">1.0.0/</a><a href="1.1.0/">1.1.0/</a><a href="fred.txt">fred.txt</a></body></html>"#.to_string()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    });
    let repository = RepositoryDescriptor::new("indexed", &server.uri()).with_derive_metadata_if_missing(true);

    let metadata = downloader()
        .download_metadata(&maven_resolver::maven::GroupArtifact::new("fred", "fred"), None, &[repository])
        .await
        .unwrap();

    assert_eq!(metadata.versioning.versions, vec!["1.0.0", "1.1.0"]);
    assert!(metadata.versioning.snapshot.is_none());
}
