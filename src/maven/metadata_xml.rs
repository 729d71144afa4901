#![allow(non_snake_case)]

//! Wire format of maven-metadata.xml and of the few parts of a POM that resolution looks at. Field
//!  names follow the XML element names.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct Metadata {
    pub groupId: Option<String>,
    pub artifactId: Option<String>,
    pub version: Option<String>,
    pub versioning: Option<Versioning>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Versioning {
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Option<Versions>,
    pub lastUpdated: Option<String>,
    pub snapshot: Option<Snapshot>,
    pub snapshotVersions: Option<SnapshotVersions>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Versions {
    #[serde(default)]
    pub version: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Snapshot {
    pub timestamp: Option<String>,
    pub buildNumber: Option<u32>,
    pub localCopy: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SnapshotVersions {
    #[serde(default)]
    pub snapshotVersion: Vec<SnapshotVersion>,
}

#[derive(Deserialize, Debug)]
pub struct SnapshotVersion {
    pub classifier: Option<String>,
    pub extension: String,
    pub value: String,
    pub updated: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Project {
    pub groupId: Option<String>,
    pub artifactId: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<Parent>,
}

#[derive(Deserialize, Debug)]
pub struct Parent {
    pub groupId: Option<String>,
    pub artifactId: Option<String>,
    pub version: Option<String>,
}

pub fn parse_metadata(data: &[u8]) -> anyhow::Result<Metadata> {
    Ok(serde_xml_rs::from_reader(data)?)
}

pub fn parse_project(data: &[u8]) -> anyhow::Result<Project> {
    Ok(serde_xml_rs::from_reader(data)?)
}
