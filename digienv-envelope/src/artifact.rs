//! Sealed artifact container.
//!
//! Keeps the wrapped passphrase and the ciphertext together so a reader
//! needs nothing but the artifact and the recipient's secret key.
//!
//! # Binary format
//!
//! ```text
//! magic "DENV" | version u8 | created_at i64 BE | wrapped_len u32 BE | wrapped key | ciphertext
//! ```
//!
//! The ciphertext runs to the end of the buffer.

use crate::error::{EnvelopeError, EnvelopeResult};
use digienv_crypto::WrappedKey;
use serde::{Deserialize, Serialize};

const MAGIC: &[u8; 4] = b"DENV";
const FORMAT_VERSION: u8 = 1;
const HEADER_SIZE: usize = MAGIC.len() + 1 + 8 + 4;

/// Durable output of a sealed envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedArtifact {
    /// Passphrase wrapped under the recipient's public key.
    pub wrapped_key: WrappedKey,
    /// Stream cipher output.
    pub ciphertext: Vec<u8>,
    /// Unix timestamp when this artifact was created.
    pub created_at: i64,
}

impl SealedArtifact {
    pub fn new(wrapped_key: WrappedKey, ciphertext: Vec<u8>) -> Self {
        Self {
            wrapped_key,
            ciphertext,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let wrapped = self.wrapped_key.to_bytes();
        let mut out = Vec::with_capacity(HEADER_SIZE + wrapped.len() + self.ciphertext.len());
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&self.created_at.to_be_bytes());
        out.extend_from_slice(&(wrapped.len() as u32).to_be_bytes());
        out.extend_from_slice(&wrapped);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> EnvelopeResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(EnvelopeError::Artifact(format!(
                "truncated header: {} bytes",
                bytes.len()
            )));
        }
        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(EnvelopeError::Artifact("bad magic".to_string()));
        }
        let (version, rest) = rest.split_at(1);
        if version[0] != FORMAT_VERSION {
            return Err(EnvelopeError::Artifact(format!(
                "unsupported version {}",
                version[0]
            )));
        }

        let (created_at, rest) = rest.split_at(8);
        let mut ts = [0u8; 8];
        ts.copy_from_slice(created_at);

        let (len_bytes, rest) = rest.split_at(4);
        let mut len = [0u8; 4];
        len.copy_from_slice(len_bytes);
        let wrapped_len = u32::from_be_bytes(len) as usize;
        if rest.len() < wrapped_len {
            return Err(EnvelopeError::Artifact(format!(
                "wrapped key truncated: declared {wrapped_len}, found {}",
                rest.len()
            )));
        }

        let (wrapped, ciphertext) = rest.split_at(wrapped_len);
        let wrapped_key = WrappedKey::from_bytes(wrapped)
            .map_err(|e| EnvelopeError::Artifact(e.to_string()))?;

        Ok(Self {
            wrapped_key,
            ciphertext: ciphertext.to_vec(),
            created_at: i64::from_be_bytes(ts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digienv_crypto::{KEY_SIZE, RecipientKeyPair, generate_passphrase, wrap_key};

    fn sample() -> SealedArtifact {
        let kp = RecipientKeyPair::generate().unwrap();
        let passphrase = generate_passphrase(KEY_SIZE).unwrap();
        let wrapped = wrap_key(&passphrase, &kp.public).unwrap();
        SealedArtifact::new(wrapped, b"ciphertext bytes".to_vec())
    }

    #[test]
    fn binary_roundtrip() {
        let artifact = sample();
        let decoded = SealedArtifact::from_bytes(&artifact.to_bytes()).unwrap();
        assert_eq!(decoded, artifact);
    }

    #[test]
    fn empty_ciphertext_roundtrip() {
        let mut artifact = sample();
        artifact.ciphertext.clear();
        let decoded = SealedArtifact::from_bytes(&artifact.to_bytes()).unwrap();
        assert!(decoded.ciphertext.is_empty());
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            SealedArtifact::from_bytes(&bytes),
            Err(EnvelopeError::Artifact(msg)) if msg == "bad magic"
        ));
    }

    #[test]
    fn unknown_version_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[4] = 9;
        assert!(SealedArtifact::from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_wrapped_key_rejected() {
        let bytes = sample().to_bytes();
        let err = SealedArtifact::from_bytes(&bytes[..HEADER_SIZE + 20]).unwrap_err();
        assert!(matches!(err, EnvelopeError::Artifact(_)));
    }
}
