//! Recipient key files.
//!
//! Plain key files hold the raw 32-byte key as a single base64 line.
//! Protected secret key files are JSON documents: the secret key is
//! encrypted with ChaCha20-Poly1305 under an Argon2id-derived key, and the
//! salt and KDF parameters travel with it so the passphrase is the only
//! input needed to load it.

use crate::error::{CryptoError, CryptoResult};
use crate::wrap::{PUBLIC_KEY_SIZE, public_key_from_slice, secret_key_from_slice};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use crypto_box::{PublicKey, SecretKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use zeroize::Zeroize;

/// Argon2id salt size in bytes.
pub const SALT_SIZE: usize = 16;
/// ChaCha20-Poly1305 nonce size in bytes.
pub const KEY_FILE_NONCE_SIZE: usize = 12;

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests. Never use for real keys.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn derive(&self, passphrase: &str, salt: &[u8]) -> CryptoResult<[u8; 32]> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, Some(32))
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut out = [0u8; 32];
        argon
            .hash_password_into(passphrase.as_bytes(), salt, &mut out)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(out)
    }
}

/// Secret key encrypted with a passphrase (Argon2id -> ChaCha20-Poly1305).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtectedSecretKey {
    pub kdf: KdfParams,
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; KEY_FILE_NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl ProtectedSecretKey {
    /// Encrypts `sk` under `passphrase`.
    pub fn protect(sk: &SecretKey, passphrase: &str, kdf: KdfParams) -> CryptoResult<Self> {
        let mut salt = [0u8; SALT_SIZE];
        let mut nonce = [0u8; KEY_FILE_NONCE_SIZE];
        rand::rngs::OsRng
            .try_fill_bytes(&mut salt)
            .and_then(|()| rand::rngs::OsRng.try_fill_bytes(&mut nonce))
            .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;

        let mut derived = kdf.derive(passphrase, &salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&derived));
        derived.zeroize();

        let mut secret = sk.to_bytes();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), secret.as_ref())
            .map_err(|e| CryptoError::Encryption(e.to_string()));
        secret.zeroize();

        Ok(Self {
            kdf,
            salt,
            nonce,
            ciphertext: ciphertext?,
        })
    }

    /// Decrypts the secret key. A wrong passphrase fails with [`CryptoError::Decryption`].
    pub fn unprotect(&self, passphrase: &str) -> CryptoResult<SecretKey> {
        let mut derived = self.kdf.derive(passphrase, &self.salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&derived));
        derived.zeroize();

        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_ref())
            .map_err(|_| {
                CryptoError::Decryption("wrong passphrase or tampered key file".to_string())
            })?;
        let secret = secret_key_from_slice(&plaintext);
        plaintext.zeroize();
        secret
    }
}

/// Writes a secret key as a base64 key file.
pub fn save_secret_key(path: &Path, sk: &SecretKey) -> CryptoResult<()> {
    let mut bytes = sk.to_bytes();
    let encoded = STANDARD.encode(bytes);
    bytes.zeroize();
    fs::write(path, format!("{encoded}\n"))?;
    Ok(())
}

/// Reads a base64 secret key file.
pub fn load_secret_key(path: &Path) -> CryptoResult<SecretKey> {
    let mut bytes = read_key_file(path)?;
    let secret = secret_key_from_slice(&bytes);
    bytes.zeroize();
    secret
}

/// Writes a public key as a base64 key file.
pub fn save_public_key(path: &Path, pk: &PublicKey) -> CryptoResult<()> {
    fs::write(path, format!("{}\n", encode_public_key(pk)))?;
    Ok(())
}

/// Reads a base64 public key file.
pub fn load_public_key(path: &Path) -> CryptoResult<PublicKey> {
    let bytes = read_key_file(path)?;
    public_key_from_slice(&bytes)
}

/// Writes a passphrase-protected secret key file.
pub fn save_protected_secret_key(path: &Path, protected: &ProtectedSecretKey) -> CryptoResult<()> {
    let json = serde_json::to_vec_pretty(protected)
        .map_err(|e| CryptoError::KeyFile(format!("serialization failed: {e}")))?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads and decrypts a passphrase-protected secret key file.
pub fn load_protected_secret_key(path: &Path, passphrase: &str) -> CryptoResult<SecretKey> {
    let json = fs::read(path)?;
    let protected: ProtectedSecretKey = serde_json::from_slice(&json)
        .map_err(|e| CryptoError::KeyFile(format!("{}: {e}", path.display())))?;
    protected.unprotect(passphrase)
}

/// Encodes a public key as base64 text.
pub fn encode_public_key(pk: &PublicKey) -> String {
    STANDARD.encode(pk.as_bytes())
}

/// Decodes a base64 public key.
pub fn decode_public_key(encoded: &str) -> CryptoResult<PublicKey> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::KeyFile(format!("invalid base64: {e}")))?;
    public_key_from_slice(&bytes)
}

fn read_key_file(path: &Path) -> CryptoResult<Vec<u8>> {
    let text = fs::read_to_string(path)?;
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| CryptoError::KeyFile(format!("{}: invalid base64: {e}", path.display())))?;
    if bytes.len() != PUBLIC_KEY_SIZE {
        return Err(CryptoError::KeyFile(format!(
            "{}: expected {PUBLIC_KEY_SIZE} key bytes, found {}",
            path.display(),
            bytes.len()
        )));
    }
    Ok(bytes)
}
