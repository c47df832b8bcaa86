//! Incremental content hashing for package restore.
//!
//! Two hash functions share one contract ([`HashFunction`]): bytes are fed
//! through `update` any number of times, then `finalize` returns the digest as
//! standard base64 exactly once. [`FnvHash64`] fingerprints restore inputs
//! cheaply; [`Sha512Hash`] produces the package content hashes recorded in
//! lock files. Both also implement [`std::io::Write`], so a serializer can
//! stream straight into them.

pub mod fnv;
pub mod sha512;

pub use fnv::FnvHash64;
pub use sha512::Sha512Hash;

use base64::Engine;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("hash has already been finalized")]
    Finalized,
    #[error("range {offset}..+{count} is outside a buffer of {len} bytes")]
    OutOfRange {
        offset: usize,
        count: usize,
        len: usize,
    },
}

impl From<HashError> for std::io::Error {
    fn from(err: HashError) -> Self {
        std::io::Error::other(err)
    }
}

/// An incremental hash producing a base64 digest.
///
/// `finalize` consumes the internal state: any later `update` or `finalize`
/// fails with [`HashError::Finalized`]. Dropping an unfinalized hash is fine.
pub trait HashFunction {
    /// Feed `count` bytes of `data` starting at `offset`.
    fn update(&mut self, data: &[u8], offset: usize, count: usize) -> Result<(), HashError>;

    /// Return the base64 digest and lock the instance.
    fn finalize(&mut self) -> Result<String, HashError>;

    /// Feed the whole buffer.
    fn update_all(&mut self, data: &[u8]) -> Result<(), HashError> {
        self.update(data, 0, data.len())
    }
}

/// Hash algorithms available for fingerprints and content hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Fnv1a64,
    Sha512,
}

impl HashAlgorithm {
    pub fn create(self) -> Box<dyn HashFunction + Send> {
        match self {
            Self::Fnv1a64 => Box::new(FnvHash64::new()),
            Self::Sha512 => Box::new(Sha512Hash::new()),
        }
    }
}

/// One-shot digest of a complete buffer.
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Fnv1a64 => encode_digest(&fnv::digest(fnv::OFFSET_BASIS, data)),
        HashAlgorithm::Sha512 => {
            use sha2::Digest;
            encode_digest(&sha2::Sha512::digest(data))
        }
    }
}

pub(crate) fn encode_digest(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_matches_incremental_sha512() {
        let mut hash = Sha512Hash::new();
        hash.update_all(b"peach").unwrap();
        assert_eq!(
            hash.finalize().unwrap(),
            hash_bytes(HashAlgorithm::Sha512, b"peach")
        );
    }

    #[test]
    fn one_shot_matches_incremental_fnv() {
        let data = b"some restore inputs";
        let mut hash = FnvHash64::new();
        hash.update_all(data).unwrap();
        assert_eq!(
            hash.finalize().unwrap(),
            hash_bytes(HashAlgorithm::Fnv1a64, data)
        );
    }

    #[test]
    fn boxed_functions_follow_the_contract() {
        for algorithm in [HashAlgorithm::Fnv1a64, HashAlgorithm::Sha512] {
            let mut hash = algorithm.create();
            hash.update_all(b"abc").unwrap();
            let digest = hash.finalize().unwrap();
            assert_eq!(digest, hash_bytes(algorithm, b"abc"));
            assert_eq!(hash.update_all(b"abc"), Err(HashError::Finalized));
            assert_eq!(hash.finalize(), Err(HashError::Finalized));
        }
    }

    #[test]
    fn hash_error_display_out_of_range() {
        let e = HashError::OutOfRange {
            offset: 4,
            count: 10,
            len: 8,
        };
        let msg = e.to_string();
        assert!(msg.contains("4..+10"));
        assert!(msg.contains("8 bytes"));
    }

    #[test]
    fn hash_error_converts_to_io_error() {
        let e: std::io::Error = HashError::Finalized.into();
        assert_eq!(e.kind(), std::io::ErrorKind::Other);
        assert!(e.to_string().contains("finalized"));
    }
}
