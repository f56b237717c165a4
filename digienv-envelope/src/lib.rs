//! Digital envelopes for streamed data.
//!
//! Bulk data is encrypted with a stream cipher under a random per-envelope
//! passphrase; the passphrase is wrapped under the recipient's public key
//! when the envelope is sealed. Only the holder of the matching secret key
//! can unseal the envelope and read it back.
//!
//! Writing:
//!
//! ```no_run
//! # use digienv_envelope::{Envelope, EnvelopeResult};
//! # use digienv_crypto::RecipientKeyPair;
//! # fn main() -> EnvelopeResult<()> {
//! # let recipient = RecipientKeyPair::generate()?;
//! let mut envelope = Envelope::new(recipient.public.clone())?;
//! {
//!     let mut scope = envelope.scope()?;
//!     scope.write(b"some data you want to encrypt")?;
//!     scope.close()?;
//! }
//! // Persist this next to the ciphertext.
//! let artifact = envelope.to_artifact()?;
//! # Ok(())
//! # }
//! ```
//!
//! Reading:
//!
//! ```no_run
//! # use digienv_envelope::{Envelope, EnvelopeResult, SealedArtifact};
//! # use digienv_crypto::RecipientKeyPair;
//! # fn main() -> EnvelopeResult<()> {
//! # let recipient = RecipientKeyPair::generate()?;
//! # let artifact: SealedArtifact = todo!();
//! let mut envelope = Envelope::from_artifact(recipient.public.clone(), artifact);
//! envelope.unseal(&recipient.secret)?;
//! let plaintext = envelope.with_scope(|env| env.read(None))?;
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod chunks;
pub mod config;
pub mod envelope;
pub mod error;
pub mod store;

pub use artifact::SealedArtifact;
pub use chunks::{Chunks, DEFAULT_CHUNK_SIZE};
pub use config::EnvelopeConfig;
pub use envelope::{Envelope, EnvelopeScope, EnvelopeState};
pub use error::{EnvelopeError, EnvelopeResult};
pub use store::{ByteStore, MemoryStore};
