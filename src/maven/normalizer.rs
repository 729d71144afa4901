use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use tracing::{debug, trace};
use url::{Host, Url};

use crate::maven::credentials::CredentialNegotiator;
use crate::maven::repository::RepositoryDescriptor;
use crate::util::compute_once::ComputeOnceCache;
use crate::util::http_transport::HttpRequest;

/// Hosts that repositories must not live on
#[derive(Clone, Debug, Default)]
pub struct HostPolicy {
    pub allow_loopback: bool,
    /// host names, compared case-insensitively
    pub blocked_hosts: Vec<String>,
}
impl HostPolicy {
    pub fn check(&self, uri: &Url) -> Result<(), String> {
        match uri.host() {
            None => Err("no host".to_string()),
            Some(Host::Ipv4(ip)) => self.check_ipv4(ip),
            Some(Host::Ipv6(ip)) => self.check_ipv6(ip),
            Some(Host::Domain(domain)) => {
                let domain = domain.to_ascii_lowercase();
                if self.blocked_hosts.iter().any(|h| h.eq_ignore_ascii_case(&domain)) {
                    return Err(format!("{} is blocked", domain));
                }
                if !self.allow_loopback && (domain == "localhost" || domain.ends_with(".localhost")) {
                    return Err(format!("{} is a loopback host", domain));
                }
                Ok(())
            }
        }
    }

    fn check_ipv4(&self, ip: Ipv4Addr) -> Result<(), String> {
        if self.blocked_hosts.iter().any(|h| h == &ip.to_string()) {
            Err(format!("{} is blocked", ip))
        }
        else if ip.is_unspecified() || ip.is_broadcast() {
            Err(format!("{} is not a routable address", ip))
        }
        else if ip.is_link_local() {
            Err(format!("{} is a link-local address", ip))
        }
        else if ip.is_loopback() && !self.allow_loopback {
            Err(format!("{} is a loopback address", ip))
        }
        else {
            Ok(())
        }
    }

    fn check_ipv6(&self, ip: Ipv6Addr) -> Result<(), String> {
        if let Some(ipv4) = ip.to_ipv4_mapped() {
            return self.check_ipv4(ipv4);
        }

        // fe80::/10
        let is_link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;

        if self.blocked_hosts.iter().any(|h| h.trim_matches(|c| c == '[' || c == ']') == ip.to_string()) {
            Err(format!("{} is blocked", ip))
        }
        else if ip.is_unspecified() {
            Err(format!("{} is not a routable address", ip))
        }
        else if is_link_local {
            Err(format!("{} is a link-local address", ip))
        }
        else if ip.is_loopback() && !self.allow_loopback {
            Err(format!("{} is a loopback address", ip))
        }
        else {
            Ok(())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NormalizationKey {
    pub uri: String,
    pub has_credentials: bool,
}

/// Whether a repository is usable. Only the verdict is shared, so descriptors for the same URI
///  keep their own id and flags.
pub type NormalizationCache = ComputeOnceCache<NormalizationKey, bool>;

/// Checks that repositories are well-formed and reachable, once per repository and execution
pub struct RepositoryNormalizer {
    negotiator: Arc<CredentialNegotiator>,
    policy: HostPolicy,
    cache: Arc<NormalizationCache>,
}
impl RepositoryNormalizer {
    pub fn new(negotiator: Arc<CredentialNegotiator>, policy: HostPolicy, cache: Arc<NormalizationCache>) -> RepositoryNormalizer {
        RepositoryNormalizer {
            negotiator,
            policy,
            cache,
        }
    }

    /// The canonical form of a usable repository, `None` for repositories that are malformed,
    ///  blocked or unreachable.
    ///
    /// NB: Any HTTP response, including error statuses, means the repository is reachable
    pub async fn normalize(&self, descriptor: &RepositoryDescriptor) -> Option<RepositoryDescriptor> {
        let canonical = descriptor.canonicalized();
        let key = NormalizationKey {
            uri: canonical.uri.clone(),
            has_credentials: canonical.credentials().is_some(),
        };

        let usable = self.cache
            .get_or_compute(key, || self.is_usable(&canonical))
            .await;
        if usable { Some(canonical) } else { None }
    }

    async fn is_usable(&self, canonical: &RepositoryDescriptor) -> bool {
        let uri = match Url::parse(&canonical.uri) {
            Ok(uri) => uri,
            Err(e) => {
                debug!("skipping repository {} with malformed URI {:?}: {}", canonical.id, canonical.uri, e);
                return false;
            }
        };

        match uri.scheme() {
            "file" => {
                if canonical.local_path().is_none() {
                    debug!("skipping repository {}: {} is not a local path", canonical.id, canonical.uri);
                    return false;
                }
                return true;
            }
            "http" | "https" => {}
            other => {
                debug!("skipping repository {}: unsupported scheme {}", canonical.id, other);
                return false;
            }
        }

        if let Err(reason) = self.policy.check(&uri) {
            debug!("skipping repository {} at {}: {}", canonical.id, canonical.uri, reason);
            return false;
        }

        if canonical.known_to_exist {
            return true;
        }

        let probe = HttpRequest::head(canonical.uri.clone());
        match self.negotiator.send_with_credentials(&probe, canonical.credentials().as_ref()).await {
            Ok(response) => {
                trace!("repository {} at {} is reachable ({})", canonical.id, canonical.uri, response.status);
                true
            }
            Err(e) => {
                debug!("skipping unreachable repository {}: {}", canonical.id, e);
                false
            }
        }
    }
}
