//! Shared test helpers for envelope integration tests.

#![allow(dead_code)]

use digienv_crypto::RecipientKeyPair;
use digienv_envelope::{Envelope, SealedArtifact};
use tracing_subscriber::EnvFilter;

/// Routes envelope debug logs through the test writer.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("digienv_envelope=debug"))
        .with_test_writer()
        .try_init();
}

pub fn recipient() -> RecipientKeyPair {
    RecipientKeyPair::generate().expect("keypair generation must succeed")
}

/// Writes `plaintext` into a fresh envelope and returns the sealed artifact.
pub fn seal_bytes(recipient: &RecipientKeyPair, plaintext: &[u8]) -> SealedArtifact {
    let mut envelope = Envelope::new(recipient.public.clone()).expect("fresh envelope");
    envelope
        .with_scope(|env| env.write(plaintext))
        .expect("write scope must succeed");
    envelope.to_artifact().expect("sealed envelope exports")
}

/// Deterministic non-trivial plaintext of `len` bytes.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
