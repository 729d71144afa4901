use bytes::Bytes;

use crate::util::checksum::{ChecksumValidator, Md5Validator, Sha1Validator};

/// A file's content together with whatever checksums its source claimed for it
#[derive(Clone, Debug)]
pub struct Blob {
    pub data: Bytes,
    pub md5: Option<[u8;16]>,
    pub sha1: Option<[u8;20]>,
}
impl Blob {
    pub fn new(data: Bytes) -> Blob {
        Blob {
            data,
            md5: None,
            sha1: None,
        }
    }

    /// Checks the data against all known checksums, returning the name of the first algorithm
    ///  that does not match
    pub fn verify(&self) -> Result<(), &'static str> {
        let mut validators: Vec<Box<dyn ChecksumValidator>> = vec![];
        if let Some(sha1) = self.sha1 {
            validators.push(Box::new(Sha1Validator::new(sha1)));
        }
        if let Some(md5) = self.md5 {
            validators.push(Box::new(Md5Validator::new(md5)));
        }

        for validator in &mut validators {
            validator.add_data(&self.data);
            if !validator.do_validate() {
                return Err(validator.algorithm());
            }
        }
        Ok(())
    }
}
