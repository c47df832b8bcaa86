use crate::{encode_digest, HashError, HashFunction};
use sha2::{Digest, Sha512};
use std::io;

/// Incremental SHA-512, the algorithm behind package content hashes.
#[derive(Debug, Clone)]
pub struct Sha512Hash {
    state: Option<Sha512>,
}

impl Sha512Hash {
    pub fn new() -> Self {
        Self {
            state: Some(Sha512::new()),
        }
    }
}

impl Default for Sha512Hash {
    fn default() -> Self {
        Self::new()
    }
}

impl HashFunction for Sha512Hash {
    fn update(&mut self, data: &[u8], offset: usize, count: usize) -> Result<(), HashError> {
        let state = self.state.as_mut().ok_or(HashError::Finalized)?;
        let window = offset
            .checked_add(count)
            .and_then(|end| data.get(offset..end))
            .ok_or(HashError::OutOfRange {
                offset,
                count,
                len: data.len(),
            })?;
        state.update(window);
        Ok(())
    }

    fn finalize(&mut self) -> Result<String, HashError> {
        let state = self.state.take().ok_or(HashError::Finalized)?;
        Ok(encode_digest(&state.finalize()))
    }
}

impl io::Write for Sha512Hash {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
