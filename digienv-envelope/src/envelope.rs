//! Envelope lifecycle state machine.
//!
//! An envelope owns the per-envelope passphrase, the byte store holding the
//! ciphertext, and the stream cipher session. The passphrase lives in one of
//! three forms:
//!
//! - **Fresh**: generated for a new envelope, only writable.
//! - **Unlocked**: recovered by unwrapping a sealed envelope, readable and writable.
//! - **Sealed**: wrapped under the recipient's public key, at rest.
//!
//! Reads and writes happen inside a scope. Entering a scope rewinds the store
//! and starts a fresh keystream; exiting it always seals the envelope, so
//! the passphrase never outlives the scope in plaintext.
//!
//! The first write of a scope discards the store past the cursor. On an
//! unlocked envelope it also replaces the passphrase and re-encrypts the
//! bytes before the cursor, so a keystream never covers two payloads.

use crate::artifact::SealedArtifact;
use crate::chunks::Chunks;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::store::{ByteStore, MemoryStore, Snapshot};
use digienv_crypto::{
    KEY_SIZE, Passphrase, PublicKey, SecretKey, StreamSession, WrappedKey, generate_passphrase,
    load_protected_secret_key, load_secret_key, unwrap_key, wrap_key,
};
use std::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use tracing::{debug, warn};

/// Lifecycle state of an [`Envelope`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeState {
    /// New plaintext passphrase, never sealed.
    Fresh,
    /// Plaintext passphrase recovered by unsealing.
    Unlocked,
    /// Passphrase wrapped under the recipient public key.
    Sealed,
}

impl fmt::Display for EnvelopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fresh => "fresh",
            Self::Unlocked => "unlocked",
            Self::Sealed => "sealed",
        };
        f.write_str(name)
    }
}

/// The passphrase in exactly one of its representations.
#[derive(Debug)]
enum KeyMaterial {
    Fresh(Passphrase),
    Unlocked(Passphrase),
    Sealed(WrappedKey),
}

impl KeyMaterial {
    fn state(&self) -> EnvelopeState {
        match self {
            Self::Fresh(_) => EnvelopeState::Fresh,
            Self::Unlocked(_) => EnvelopeState::Unlocked,
            Self::Sealed(_) => EnvelopeState::Sealed,
        }
    }

    fn plaintext(&self) -> Option<&Passphrase> {
        match self {
            Self::Fresh(p) | Self::Unlocked(p) => Some(p),
            Self::Sealed(_) => None,
        }
    }
}

/// Stream-encrypted data whose key is sealed under a recipient public key.
///
/// Not thread-safe: one cursor and one keystream are shared by all calls, so
/// concurrent users must serialize access externally.
#[derive(Debug)]
pub struct Envelope<S: ByteStore = MemoryStore> {
    recipient: PublicKey,
    key: KeyMaterial,
    session: Option<StreamSession>,
    written: bool,
    store: S,
}

impl Envelope<MemoryStore> {
    /// Creates a fresh envelope over an empty in-memory store.
    pub fn new(recipient: PublicKey) -> EnvelopeResult<Self> {
        Self::with_store(recipient, Cursor::new(Vec::new()))
    }

    /// Creates a sealed envelope over an artifact's ciphertext.
    pub fn from_artifact(recipient: PublicKey, artifact: SealedArtifact) -> Self {
        Self::sealed(recipient, artifact.wrapped_key, Cursor::new(artifact.ciphertext))
    }

    /// Snapshots the sealed wrapped key and ciphertext.
    pub fn to_artifact(&self) -> EnvelopeResult<SealedArtifact> {
        match &self.key {
            KeyMaterial::Sealed(wrapped) => Ok(SealedArtifact::new(
                wrapped.clone(),
                self.store.get_ref().clone(),
            )),
            other => Err(EnvelopeError::InvalidState {
                operation: "export artifact",
                state: other.state(),
            }),
        }
    }
}

impl<S: ByteStore> Envelope<S> {
    /// Creates a fresh envelope with a newly generated passphrase.
    pub fn with_store(recipient: PublicKey, store: S) -> EnvelopeResult<Self> {
        let passphrase = generate_passphrase(KEY_SIZE)?;
        debug!("created fresh envelope");
        Ok(Self {
            recipient,
            key: KeyMaterial::Fresh(passphrase),
            session: None,
            written: false,
            store,
        })
    }

    /// Creates a sealed envelope from a previously wrapped key and its ciphertext.
    ///
    /// `recipient` is used if the envelope is sealed again after unsealing.
    pub fn sealed(recipient: PublicKey, wrapped_key: WrappedKey, store: S) -> Self {
        Self {
            recipient,
            key: KeyMaterial::Sealed(wrapped_key),
            session: None,
            written: false,
            store,
        }
    }

    pub fn state(&self) -> EnvelopeState {
        self.key.state()
    }

    /// Whether a read/write scope is currently open.
    pub fn is_scoped(&self) -> bool {
        self.session.is_some()
    }

    /// The wrapped passphrase to persist alongside the ciphertext, once sealed.
    pub fn wrapped_key(&self) -> Option<&WrappedKey> {
        match &self.key {
            KeyMaterial::Sealed(wrapped) => Some(wrapped),
            _ => None,
        }
    }

    pub fn recipient(&self) -> &PublicKey {
        &self.recipient
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the envelope, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Opens a read/write scope.
    ///
    /// Rewinds the store to offset 0 and starts a keystream from the
    /// plaintext passphrase. Fails on a sealed envelope or if a scope is
    /// already open.
    pub fn enter_scope(&mut self) -> EnvelopeResult<()> {
        if self.session.is_some() {
            return Err(EnvelopeError::InvalidState {
                operation: "enter a nested scope",
                state: self.state(),
            });
        }
        let passphrase = self.key.plaintext().ok_or(EnvelopeError::InvalidState {
            operation: "enter scope",
            state: EnvelopeState::Sealed,
        })?;

        let session = StreamSession::new(passphrase)?;
        self.store.seek(SeekFrom::Start(0))?;
        self.session = Some(session);
        self.written = false;
        debug!("entered {} envelope scope", self.state());
        Ok(())
    }

    /// Closes the scope and seals the envelope.
    ///
    /// Sealing is unconditional: exiting a read scope re-wraps the
    /// passphrase under the recipient key, and exiting with no open scope on
    /// a sealed envelope fails with [`EnvelopeError::AlreadySealed`].
    pub fn exit_scope(&mut self) -> EnvelopeResult<()> {
        self.session = None;
        self.seal()
    }

    /// Opens a scope guarded by an [`EnvelopeScope`], which seals on drop.
    pub fn scope(&mut self) -> EnvelopeResult<EnvelopeScope<'_, S>> {
        self.enter_scope()?;
        Ok(EnvelopeScope {
            envelope: self,
            closed: false,
        })
    }

    /// Runs `f` inside a scope and seals afterwards, on success and on error.
    ///
    /// An error from `f` takes precedence over a sealing error.
    pub fn with_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> EnvelopeResult<T>,
    ) -> EnvelopeResult<T> {
        let mut scope = self.scope()?;
        let value = f(&mut *scope)?;
        scope.close()?;
        Ok(value)
    }

    /// Encrypts `data` and writes it at the current store position.
    ///
    /// The first non-empty write of a scope truncates the store at the
    /// cursor; on an unlocked envelope it also rekeys (see the module docs).
    /// A failed write is rolled back: the overwritten bytes and the store
    /// length are restored. If the store also refuses the rollback, the
    /// bytes already written stay and the failure is logged.
    pub fn write(&mut self, data: &[u8]) -> EnvelopeResult<()> {
        if self.session.is_none() {
            return Err(EnvelopeError::Closed);
        }
        if data.is_empty() {
            return Ok(());
        }
        if !self.written {
            self.begin_write()?;
        }
        let session = self.session.as_mut().ok_or(EnvelopeError::Closed)?;

        let start = self.store.stream_position()?;
        let snapshot = match Snapshot::capture(&mut self.store, start, data.len() as u64) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                realign(session, &mut self.store);
                return Err(e.into());
            }
        };
        let mut buf = data.to_vec();
        session.encrypt_in_place(&mut buf);
        if let Err(e) = self.store.write_all(&buf) {
            match snapshot.restore(&mut self.store) {
                Ok(()) => session.seek(start),
                Err(undo) => {
                    warn!("failed to roll back partial envelope write: {undo}");
                    realign(session, &mut self.store);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Truncates the store at the cursor, rekeying an unlocked envelope first.
    fn begin_write(&mut self) -> EnvelopeResult<()> {
        let position = self.store.stream_position()?;
        let KeyMaterial::Unlocked(current) = &self.key else {
            self.store.set_len(position)?;
            self.written = true;
            return Ok(());
        };

        let passphrase = generate_passphrase(KEY_SIZE)?;
        let mut previous = StreamSession::new(current)?;
        let mut session = StreamSession::new(&passphrase)?;

        let snapshot = match Snapshot::capture(&mut self.store, 0, position) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if let Some(session) = self.session.as_mut() {
                    realign(session, &mut self.store);
                }
                return Err(e.into());
            }
        };
        let mut prefix = snapshot.bytes().to_vec();
        previous.decrypt_in_place(&mut prefix);
        session.encrypt_in_place(&mut prefix);

        let rewritten = self
            .store
            .write_all(&prefix)
            .and_then(|()| self.store.set_len(position))
            .and_then(|()| self.store.seek(SeekFrom::Start(position)).map(drop));
        if let Err(e) = rewritten {
            if let Err(undo) = snapshot
                .restore(&mut self.store)
                .and_then(|()| self.store.seek(SeekFrom::Start(position)).map(drop))
            {
                warn!("failed to restore envelope store after rekey: {undo}");
            }
            if let Some(session) = self.session.as_mut() {
                realign(session, &mut self.store);
            }
            return Err(e.into());
        }

        session.seek(position);
        self.key = KeyMaterial::Unlocked(passphrase);
        self.session = Some(session);
        self.written = true;
        debug!("rekeyed unlocked envelope for rewrite at offset {position}");
        Ok(())
    }

    /// Reads and decrypts up to `len` bytes, or everything remaining when `len` is `None`.
    ///
    /// Returns fewer bytes only at the end of the store; an empty result
    /// means the store is exhausted.
    pub fn read(&mut self, len: Option<usize>) -> EnvelopeResult<Vec<u8>> {
        let state = self.state();
        if state == EnvelopeState::Sealed {
            return Err(EnvelopeError::Sealed);
        }
        let session = self.session.as_mut().ok_or(EnvelopeError::Closed)?;
        if state != EnvelopeState::Unlocked {
            return Err(EnvelopeError::InvalidState {
                operation: "read",
                state,
            });
        }

        let mut buf = Vec::new();
        let result = match len {
            Some(n) => (&mut self.store).take(n as u64).read_to_end(&mut buf),
            None => self.store.read_to_end(&mut buf),
        };
        if let Err(e) = result {
            realign(session, &mut self.store);
            return Err(e.into());
        }
        session.decrypt_in_place(&mut buf);
        Ok(buf)
    }

    /// Lazily reads decrypted chunks of at most `chunk_size` bytes until the store is exhausted.
    ///
    /// Each step goes through [`Envelope::read`], so the same state rules apply.
    pub fn read_chunks(&mut self, chunk_size: usize) -> Chunks<'_, S> {
        Chunks::new(self, chunk_size)
    }

    /// Moves the store cursor. Inside a scope the keystream follows it.
    pub fn seek(&mut self, pos: SeekFrom) -> EnvelopeResult<u64> {
        let position = self.store.seek(pos)?;
        if let Some(session) = self.session.as_mut() {
            session.seek(position);
        }
        Ok(position)
    }

    /// Wraps the passphrase under the recipient public key.
    ///
    /// Also closes any open scope. Fails with [`EnvelopeError::AlreadySealed`]
    /// when already sealed; a failed wrap leaves the envelope untouched.
    pub fn seal(&mut self) -> EnvelopeResult<()> {
        let passphrase = self.key.plaintext().ok_or(EnvelopeError::AlreadySealed)?;
        let previous = self.state();

        let wrapped = wrap_key(passphrase, &self.recipient)?;
        self.session = None;
        self.written = false;
        self.key = KeyMaterial::Sealed(wrapped);
        debug!("sealed {previous} envelope");
        Ok(())
    }

    /// Unwraps the passphrase with the recipient's secret key.
    ///
    /// A wrong key or corrupted wrapped key fails with
    /// [`EnvelopeError::Unwrap`] and leaves the envelope sealed.
    pub fn unseal(&mut self, secret: &SecretKey) -> EnvelopeResult<()> {
        let KeyMaterial::Sealed(wrapped) = &self.key else {
            return Err(EnvelopeError::InvalidState {
                operation: "unseal",
                state: self.state(),
            });
        };

        let passphrase = unwrap_key(wrapped, secret)?;
        self.key = KeyMaterial::Unlocked(passphrase);
        debug!("unsealed envelope");
        Ok(())
    }

    /// Unseals with a secret key loaded from a base64 key file.
    pub fn unseal_with_key_file(&mut self, path: &Path) -> EnvelopeResult<()> {
        let secret = load_secret_key(path)?;
        self.unseal(&secret)
    }

    /// Unseals with a passphrase-protected secret key file.
    pub fn unseal_with_protected_key_file(
        &mut self,
        path: &Path,
        passphrase: &str,
    ) -> EnvelopeResult<()> {
        let secret = load_protected_secret_key(path, passphrase)?;
        self.unseal(&secret)
    }
}

// Best effort: keep the keystream at the store offset after a failed I/O call.
fn realign<S: ByteStore>(session: &mut StreamSession, store: &mut S) {
    if let Ok(position) = store.stream_position() {
        session.seek(position);
    }
}

/// Open envelope scope. Dereferences to the [`Envelope`] and seals it when dropped.
///
/// Prefer [`EnvelopeScope::close`] to observe sealing errors; `Drop` can only log them.
pub struct EnvelopeScope<'a, S: ByteStore> {
    envelope: &'a mut Envelope<S>,
    closed: bool,
}

impl<S: ByteStore> EnvelopeScope<'_, S> {
    /// Exits the scope, sealing the envelope unless it was sealed inside the scope.
    pub fn close(mut self) -> EnvelopeResult<()> {
        self.closed = true;
        self.finish()
    }

    fn finish(&mut self) -> EnvelopeResult<()> {
        self.envelope.session = None;
        if self.envelope.state() == EnvelopeState::Sealed {
            return Ok(());
        }
        self.envelope.seal()
    }
}

impl<S: ByteStore> Deref for EnvelopeScope<'_, S> {
    type Target = Envelope<S>;

    fn deref(&self) -> &Self::Target {
        self.envelope
    }
}

impl<S: ByteStore> DerefMut for EnvelopeScope<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.envelope
    }
}

impl<S: ByteStore> Drop for EnvelopeScope<'_, S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.finish() {
            warn!("failed to seal envelope on scope exit: {e}");
        }
    }
}
