//! XChaCha20 stream cipher session.
//!
//! A session is derived deterministically from a 32-byte passphrase, so a
//! reader holding the unwrapped passphrase reproduces the writer's keystream.
//! Encryption and decryption are the same keystream XOR, byte for byte, which
//! lets callers read arbitrary slices of a stream without framing.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KEY_SIZE, Passphrase};
use chacha20::XChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};

/// Size of the XChaCha20 nonce in bytes.
pub const STREAM_NONCE_SIZE: usize = 24;

// Fixed per domain. A passphrase must key at most one payload; callers
// rewriting a stream draw a new passphrase first.
const STREAM_NONCE: [u8; STREAM_NONCE_SIZE] = *b"digienv/stream/nonce/v1\0";

/// Active keystream positioned at a byte offset of the protected stream.
pub struct StreamSession {
    cipher: XChaCha20,
}

impl StreamSession {
    /// Creates a session at stream offset 0.
    pub fn new(passphrase: &Passphrase) -> CryptoResult<Self> {
        if passphrase.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: passphrase.len(),
            });
        }
        let cipher = XChaCha20::new(
            chacha20::Key::from_slice(passphrase.as_bytes()),
            chacha20::XNonce::from_slice(&STREAM_NONCE),
        );
        Ok(Self { cipher })
    }

    /// Encrypts `data` in place and advances the keystream.
    pub fn encrypt_in_place(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data);
    }

    /// Decrypts `data` in place and advances the keystream.
    pub fn decrypt_in_place(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data);
    }

    /// Returns an encrypted copy of `data`.
    pub fn encrypt(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.encrypt_in_place(&mut out);
        out
    }

    /// Returns a decrypted copy of `data`.
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.decrypt_in_place(&mut out);
        out
    }

    /// Moves the keystream to an absolute stream offset.
    pub fn seek(&mut self, position: u64) {
        self.cipher.seek(position);
    }

    /// Current keystream offset.
    pub fn position(&self) -> u64 {
        self.cipher.current_pos::<u64>()
    }
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}
