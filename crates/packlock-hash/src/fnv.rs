use crate::{encode_digest, HashError, HashFunction};
use std::io;

pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

pub(crate) fn fold(mut hash: u64, data: &[u8]) -> u64 {
    for &byte in data {
        hash = (hash ^ u64::from(byte)).wrapping_mul(PRIME);
    }
    hash
}

pub(crate) fn digest(basis: u64, data: &[u8]) -> [u8; 8] {
    fold(basis, data).to_le_bytes()
}

/// FNV-1a with a 64-bit accumulator.
///
/// `update(data, offset, count)` consumes the bytes at indices
/// `offset..count`: `count` bounds the index, it is not a length. Stored
/// restore fingerprints were produced under this rule; for `offset == 0` it
/// coincides with the usual reading, which is what streaming callers use.
#[derive(Debug, Clone)]
pub struct FnvHash64 {
    state: Option<u64>,
}

impl FnvHash64 {
    pub fn new() -> Self {
        Self {
            state: Some(OFFSET_BASIS),
        }
    }
}

impl Default for FnvHash64 {
    fn default() -> Self {
        Self::new()
    }
}

impl HashFunction for FnvHash64 {
    fn update(&mut self, data: &[u8], offset: usize, count: usize) -> Result<(), HashError> {
        let state = self.state.as_mut().ok_or(HashError::Finalized)?;
        if count > data.len() {
            return Err(HashError::OutOfRange {
                offset,
                count,
                len: data.len(),
            });
        }
        if offset < count {
            *state = fold(*state, &data[offset..count]);
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<String, HashError> {
        let state = self.state.take().ok_or(HashError::Finalized)?;
        Ok(encode_digest(&state.to_le_bytes()))
    }
}

impl io::Write for FnvHash64 {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
