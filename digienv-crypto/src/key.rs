//! Symmetric passphrase generation.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the stream cipher key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Random symmetric key used directly as the stream cipher key.
///
/// The bytes are zeroized when the passphrase is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Passphrase {
    bytes: Vec<u8>,
}

impl Passphrase {
    /// Wraps existing key bytes (e.g. the output of an unwrap).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passphrase")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Generates `length` bytes of key material from the operating system CSPRNG.
///
/// A failing entropy source is reported as [`CryptoError::EntropyUnavailable`]
/// and never retried here.
pub fn generate_passphrase(length: usize) -> CryptoResult<Passphrase> {
    let mut bytes = vec![0u8; length];
    rand::rngs::OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
    Ok(Passphrase { bytes })
}
