use hex::FromHex;
use hyper::HeaderMap;
use sha1::{Digest, Sha1};
use tracing::trace;

/// Validation that needs to see all of a file's data before it can decide, e.g. checking a hash
pub trait ChecksumValidator: Send {
    fn algorithm(&self) -> &'static str;
    fn add_data(&mut self, data: &[u8]);
    fn do_validate(&self) -> bool;
}

pub struct Sha1Validator {
    hasher: Sha1,
    expected_hash: [u8; 20],
}
impl Sha1Validator {
    pub fn new(expected_hash: [u8; 20]) -> Sha1Validator {
        Sha1Validator {
            hasher: Sha1::new(),
            expected_hash,
        }
    }
}
impl ChecksumValidator for Sha1Validator {
    fn algorithm(&self) -> &'static str {
        "sha1"
    }

    fn add_data(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn do_validate(&self) -> bool {
        let hash = self.hasher.clone().finalize();
        trace!("validating SHA1 hash");
        hash.as_slice() == self.expected_hash
    }
}

pub struct Md5Validator {
    context: md5::Context,
    expected_hash: [u8; 16],
}
impl Md5Validator {
    pub fn new(expected_hash: [u8; 16]) -> Md5Validator {
        Md5Validator {
            context: md5::Context::new(),
            expected_hash,
        }
    }
}
impl ChecksumValidator for Md5Validator {
    fn algorithm(&self) -> &'static str {
        "md5"
    }

    fn add_data(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    fn do_validate(&self) -> bool {
        let hash = self.context.clone().compute();
        trace!("validating MD5 hash");
        hash.0 == self.expected_hash
    }
}

/// Checksums a server announces in its response headers. Artifactory, Nexus and GCS-backed
///  repositories use different header names; Maven Central sends the SHA1 as the (quoted) etag.
///
/// Headers that are present but do not hold a well-formed hash are ignored.
pub fn announced_checksums(headers: &HeaderMap) -> (Option<[u8; 20]>, Option<[u8; 16]>) {
    let sha1 = headers.get("x-checksum-sha1")
        .or_else(|| headers.get("x-goog-meta-checksum-sha1"))
        .or_else(|| headers.get("etag"))
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_matches('"'))
        .and_then(|s| <[u8; 20]>::from_hex(s).ok());

    let md5 = headers.get("x-checksum-md5")
        .or_else(|| headers.get("x-goog-meta-checksum-md5"))
        .and_then(|h| h.to_str().ok())
        .and_then(|s| <[u8; 16]>::from_hex(s).ok());

    trace!("announced checksums: sha1 {:?}, md5 {:?}", sha1.map(hex::encode), md5.map(hex::encode));
    (sha1, md5)
}
