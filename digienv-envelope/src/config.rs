//! Envelope configuration.
//!
//! The recipient public key is the trust anchor for every envelope sealed
//! with this configuration. It is always supplied from outside.

use crate::artifact::SealedArtifact;
use crate::chunks::DEFAULT_CHUNK_SIZE;
use crate::envelope::Envelope;
use crate::error::{EnvelopeError, EnvelopeResult};
use digienv_crypto::{PublicKey, decode_public_key};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for sealing and opening envelopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Recipient X25519 public key, base64-encoded.
    pub recipient_public_key: String,

    /// Base64 secret key file used to open envelopes.
    pub private_key_path: Option<PathBuf>,

    /// Chunk size for streaming reads and writes (bytes).
    pub chunk_size: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            recipient_public_key: String::new(),
            private_key_path: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl EnvelopeConfig {
    /// Loads a JSON configuration file.
    pub fn from_json_file(path: &Path) -> EnvelopeResult<Self> {
        let bytes = fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the recipient key decodes and the chunk size is usable.
    pub fn validate(&self) -> EnvelopeResult<()> {
        if self.chunk_size == 0 {
            return Err(EnvelopeError::Config("chunk_size must be positive".into()));
        }
        self.recipient().map(|_| ())
    }

    /// Decodes the configured recipient public key.
    pub fn recipient(&self) -> EnvelopeResult<PublicKey> {
        if self.recipient_public_key.trim().is_empty() {
            return Err(EnvelopeError::Config(
                "recipient_public_key is not set".into(),
            ));
        }
        decode_public_key(&self.recipient_public_key)
            .map_err(|e| EnvelopeError::Config(format!("recipient_public_key: {e}")))
    }

    /// Creates a fresh in-memory envelope for the configured recipient.
    pub fn create_envelope(&self) -> EnvelopeResult<Envelope> {
        Envelope::new(self.recipient()?)
    }

    /// Rebuilds an artifact's envelope and unseals it with the configured key file.
    pub fn open_artifact(&self, artifact: SealedArtifact) -> EnvelopeResult<Envelope> {
        let key_path = self
            .private_key_path
            .as_deref()
            .ok_or_else(|| EnvelopeError::Config("private_key_path is not set".into()))?;

        let mut envelope = Envelope::from_artifact(self.recipient()?, artifact);
        envelope.unseal_with_key_file(key_path)?;
        Ok(envelope)
    }

    /// Streams `reader` into a new envelope and returns the sealed artifact.
    pub fn seal_reader(&self, reader: &mut impl Read) -> EnvelopeResult<SealedArtifact> {
        let mut envelope = self.create_envelope()?;
        let chunk_size = self.chunk_size.max(1);

        let written = envelope.with_scope(|env| {
            let mut buf = vec![0u8; chunk_size];
            let mut total = 0u64;
            loop {
                let n = reader.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                env.write(&buf[..n])?;
                total += n as u64;
            }
            Ok(total)
        })?;

        debug!("sealed {written} bytes into envelope");
        envelope.to_artifact()
    }

    /// Opens `artifact` and streams its plaintext into `writer` chunk by chunk.
    ///
    /// Returns the number of plaintext bytes written. The envelope is
    /// sealed again once the copy finishes.
    pub fn open_to_writer(
        &self,
        artifact: SealedArtifact,
        writer: &mut impl Write,
    ) -> EnvelopeResult<u64> {
        let mut envelope = self.open_artifact(artifact)?;
        let chunk_size = self.chunk_size.max(1);

        let copied = envelope.with_scope(|env| {
            let mut total = 0u64;
            for chunk in env.read_chunks(chunk_size) {
                let chunk = chunk?;
                writer.write_all(&chunk)?;
                total += chunk.len() as u64;
            }
            Ok(total)
        })?;
        writer.flush()?;

        debug!("opened envelope, {copied} bytes written");
        Ok(copied)
    }
}
