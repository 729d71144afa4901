use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::maven::normalizer::HostPolicy;
use crate::maven::repository::RepositoryDescriptor;
use crate::util::http_transport::TransportSettings;

pub const CONFIG_PATH_ENV: &str = "MAVEN_RESOLVER_CONFIG";

pub const MAVEN_CENTRAL_URI: &str = "https://repo.maven.apache.org/maven2";

/// Configuration for resolving artifacts, read from a JSON file. All fields are optional.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub listen_address: String,
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    /// per attempt, covering the entire exchange
    pub read_timeout_ms: u64,
    /// total attempts for requests that got no response
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// repositories on loopback addresses are rejected unless this is set
    pub allow_loopback: bool,
    pub blocked_hosts: Vec<String>,
    /// consulted before any other repository
    pub local_repository: Option<RepositoryDescriptor>,
    pub repositories: Vec<RepositoryDescriptor>,
}
impl Default for ResolverConfig {
    fn default() -> Self {
        let transport = TransportSettings::default();

        ResolverConfig {
            listen_address: "127.0.0.1:3000".to_string(),
            user_agent: transport.user_agent,
            connect_timeout_ms: transport.connect_timeout.as_millis() as u64,
            read_timeout_ms: transport.read_timeout.as_millis() as u64,
            max_attempts: transport.max_attempts,
            retry_delay_ms: transport.retry_delay.as_millis() as u64,
            allow_loopback: false,
            blocked_hosts: vec![],
            local_repository: None,
            repositories: vec![
                RepositoryDescriptor::new("central", MAVEN_CENTRAL_URI)
                    .with_snapshots(false)
                    .with_known_to_exist(true),
            ],
        }
    }
}
impl ResolverConfig {
    pub fn load(path: &Path) -> anyhow::Result<ResolverConfig> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("parsing configuration in {}", path.display()))
    }

    /// Reads the file named by the first command line argument or by $MAVEN_RESOLVER_CONFIG,
    ///  falling back to defaults if neither is given
    pub fn from_args_or_env() -> anyhow::Result<ResolverConfig> {
        let path = std::env::args().nth(1)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());

        match path {
            Some(path) => {
                info!("loading configuration from {}", path);
                ResolverConfig::load(Path::new(&path))
            }
            None => {
                info!("no configuration given, using defaults");
                Ok(ResolverConfig::default())
            }
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn host_policy(&self) -> HostPolicy {
        HostPolicy {
            allow_loopback: self.allow_loopback,
            blocked_hosts: self.blocked_hosts.clone(),
        }
    }
}
