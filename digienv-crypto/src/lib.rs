//! Cryptographic primitives for digital envelopes.
//!
//! Provides the pieces an envelope is assembled from:
//! - OS-backed passphrase generation for the per-envelope symmetric key
//! - XChaCha20 stream cipher sessions keyed by that passphrase
//! - Key wrapping with X25519 + XSalsa20-Poly1305 (sealed box)
//! - Recipient key files, plain or passphrase-protected (Argon2id)
//!
//! # Architecture
//!
//! Bulk data never touches the asymmetric layer:
//!
//! 1. **Passphrase**: 32 random bytes generated per envelope and used
//!    directly as the stream cipher key.
//!
//! 2. **Wrapped key**: the passphrase sealed under the recipient's public
//!    key. Only the matching secret key can recover it.
//!
//! The wrapped key is stored next to the ciphertext; neither is useful
//! without the recipient's secret key.

mod cipher;
mod error;
mod key;
pub mod keyfile;
pub mod wrap;

pub use cipher::{STREAM_NONCE_SIZE, StreamSession};
pub use crypto_box::{PublicKey, SecretKey};
pub use error::{CryptoError, CryptoResult};
pub use key::{KEY_SIZE, Passphrase, generate_passphrase};
pub use keyfile::{
    KdfParams, ProtectedSecretKey, decode_public_key, encode_public_key, load_protected_secret_key,
    load_public_key, load_secret_key, save_protected_secret_key, save_public_key,
    save_secret_key,
};
pub use wrap::{
    RecipientKeyPair, WRAPPED_KEY_SIZE, WrappedKey, public_key_from_slice, secret_key_from_slice,
    unwrap_key, wrap_key,
};
