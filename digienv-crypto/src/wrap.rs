//! Asymmetric key wrapping for envelope passphrases.
//!
//! Uses X25519 key exchange + XSalsa20-Poly1305 to protect a passphrase
//! under a recipient's public key. Each wrap uses a fresh ephemeral keypair
//! and nonce, so wrapping the same passphrase twice yields different bytes.
//!
//! # Wire format
//!
//! ```text
//! ephemeral_public_key (32) | nonce (24) | ciphertext_len (u32 BE) | ciphertext
//! ```
//!
//! The ciphertext carries a 16-byte Poly1305 tag, so a 32-byte passphrase
//! wraps to exactly [`WRAPPED_KEY_SIZE`] bytes.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KEY_SIZE, Passphrase};
use crypto_box::aead::{Aead, Nonce};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Size of an X25519 public or secret key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Size of the XSalsa20 nonce in bytes.
pub const WRAP_NONCE_SIZE: usize = 24;
/// Poly1305 authentication tag overhead.
pub const WRAP_TAG_SIZE: usize = 16;

const LENGTH_PREFIX_SIZE: usize = 4;
const HEADER_SIZE: usize = PUBLIC_KEY_SIZE + WRAP_NONCE_SIZE + LENGTH_PREFIX_SIZE;

/// Encoded size of a wrapped [`KEY_SIZE`]-byte passphrase.
pub const WRAPPED_KEY_SIZE: usize = HEADER_SIZE + KEY_SIZE + WRAP_TAG_SIZE;

/// X25519 keypair of an envelope recipient.
///
/// The secret key implements `ZeroizeOnDrop` automatically (from crypto_box).
pub struct RecipientKeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl RecipientKeyPair {
    /// Generates a new keypair from the OS CSPRNG.
    pub fn generate() -> CryptoResult<Self> {
        let secret = random_secret_key()?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// Returns the public key as raw 32-byte array.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Returns the secret key as raw 32-byte array.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Reconstructs a keypair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = SecretKey::from(bytes);
        let public = secret.public_key();
        Self { secret, public }
    }
}

/// Passphrase sealed under a recipient's X25519 public key.
///
/// Opaque to everything but [`unwrap_key`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    /// Ephemeral X25519 public key (sender side of DH).
    pub ephemeral_public_key: [u8; 32],
    /// XSalsa20 nonce (24 bytes).
    pub nonce: [u8; 24],
    /// Encrypted passphrase (XSalsa20-Poly1305 ciphertext + Poly1305 tag).
    pub ciphertext: Vec<u8>,
}

impl WrappedKey {
    /// Encodes the wrapped key in its length-prefixed binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.ephemeral_public_key);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&(self.ciphertext.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Decodes the binary form produced by [`WrappedKey::to_bytes`].
    ///
    /// Truncated input, trailing bytes and length mismatches are rejected.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CryptoError::Unwrap(format!(
                "wrapped key truncated: {} bytes, header needs {HEADER_SIZE}",
                bytes.len()
            )));
        }
        let (ephemeral, rest) = bytes.split_at(PUBLIC_KEY_SIZE);
        let (nonce, rest) = rest.split_at(WRAP_NONCE_SIZE);
        let (len_bytes, ciphertext) = rest.split_at(LENGTH_PREFIX_SIZE);

        let mut len = [0u8; LENGTH_PREFIX_SIZE];
        len.copy_from_slice(len_bytes);
        let declared = u32::from_be_bytes(len) as usize;
        if declared != ciphertext.len() {
            return Err(CryptoError::Unwrap(format!(
                "wrapped key length mismatch: declared {declared}, found {}",
                ciphertext.len()
            )));
        }

        let mut ephemeral_public_key = [0u8; PUBLIC_KEY_SIZE];
        ephemeral_public_key.copy_from_slice(ephemeral);
        let mut nonce_bytes = [0u8; WRAP_NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);

        Ok(Self {
            ephemeral_public_key,
            nonce: nonce_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Length of the encoded form in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.ciphertext.len()
    }
}

/// Wraps (encrypts) a passphrase for a recipient using anonymous sealed-box encryption.
///
/// An ephemeral X25519 keypair is generated for each call; callers must not
/// rely on the output being deterministic.
pub fn wrap_key(passphrase: &Passphrase, recipient_pk: &PublicKey) -> CryptoResult<WrappedKey> {
    let ephemeral = random_secret_key()?;
    let ephemeral_pk = ephemeral.public_key();

    let salsa_box = SalsaBox::new(recipient_pk, &ephemeral);

    let mut nonce_bytes = [0u8; WRAP_NONCE_SIZE];
    fill_random(&mut nonce_bytes)?;

    let ciphertext = salsa_box
        .encrypt(Nonce::<SalsaBox>::from_slice(&nonce_bytes), passphrase.as_bytes())
        .map_err(|e| CryptoError::Wrap(format!("sealed box encryption failed: {e}")))?;

    Ok(WrappedKey {
        ephemeral_public_key: *ephemeral_pk.as_bytes(),
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Unwraps (decrypts) a passphrase using the recipient's secret key.
pub fn unwrap_key(wrapped: &WrappedKey, recipient_sk: &SecretKey) -> CryptoResult<Passphrase> {
    let ephemeral_pk = PublicKey::from(wrapped.ephemeral_public_key);
    let salsa_box = SalsaBox::new(&ephemeral_pk, recipient_sk);

    salsa_box
        .decrypt(
            Nonce::<SalsaBox>::from_slice(&wrapped.nonce),
            wrapped.ciphertext.as_ref(),
        )
        .map(Passphrase::from_bytes)
        .map_err(|_| {
            CryptoError::Unwrap("wrong private key or tampered wrapped key".to_string())
        })
}

/// Parses a raw 32-byte X25519 public key.
pub fn public_key_from_slice(bytes: &[u8]) -> CryptoResult<PublicKey> {
    let arr: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| invalid_length(bytes))?;
    Ok(PublicKey::from(arr))
}

/// Parses a raw 32-byte X25519 secret key.
pub fn secret_key_from_slice(bytes: &[u8]) -> CryptoResult<SecretKey> {
    let mut arr: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| invalid_length(bytes))?;
    let secret = SecretKey::from(arr);
    arr.zeroize();
    Ok(secret)
}

fn invalid_length(bytes: &[u8]) -> CryptoError {
    CryptoError::InvalidKeyLength {
        expected: PUBLIC_KEY_SIZE,
        actual: bytes.len(),
    }
}

fn random_secret_key() -> CryptoResult<SecretKey> {
    let mut bytes = [0u8; PUBLIC_KEY_SIZE];
    fill_random(&mut bytes)?;
    let secret = SecretKey::from(bytes);
    bytes.zeroize();
    Ok(secret)
}

fn fill_random(buf: &mut [u8]) -> CryptoResult<()> {
    rand::rngs::OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::generate_passphrase;

    #[test]
    fn wrapped_passphrase_has_documented_size() {
        let recipient = RecipientKeyPair::generate().unwrap();
        let passphrase = generate_passphrase(KEY_SIZE).unwrap();

        let wrapped = wrap_key(&passphrase, &recipient.public).unwrap();
        assert_eq!(wrapped.ciphertext.len(), KEY_SIZE + WRAP_TAG_SIZE);
        assert_eq!(wrapped.to_bytes().len(), WRAPPED_KEY_SIZE);
        assert_eq!(wrapped.encoded_len(), WRAPPED_KEY_SIZE);
    }

    #[test]
    fn header_truncation_rejected() {
        let err = WrappedKey::from_bytes(&[0u8; HEADER_SIZE - 1]).unwrap_err();
        assert!(matches!(err, CryptoError::Unwrap(_)));
    }

    #[test]
    fn empty_ciphertext_decodes() {
        let bytes = [0u8; HEADER_SIZE];
        let wrapped = WrappedKey::from_bytes(&bytes).unwrap();
        assert!(wrapped.ciphertext.is_empty());
    }

    #[test]
    fn secret_key_slice_must_be_32_bytes() {
        assert!(secret_key_from_slice(&[1u8; 31]).is_err());
        assert!(secret_key_from_slice(&[1u8; 32]).is_ok());
    }
}
