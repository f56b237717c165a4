//! Lazy chunked reads over an open envelope.

use crate::envelope::Envelope;
use crate::error::EnvelopeResult;
use crate::store::ByteStore;

/// Default chunk size for streaming reads.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Iterator over decrypted chunks of at most `chunk_size` bytes.
///
/// Finite and not restartable: it ends at the first empty read and stops
/// for good after yielding an error.
pub struct Chunks<'a, S: ByteStore> {
    envelope: &'a mut Envelope<S>,
    chunk_size: usize,
    done: bool,
}

impl<'a, S: ByteStore> Chunks<'a, S> {
    pub(crate) fn new(envelope: &'a mut Envelope<S>, chunk_size: usize) -> Self {
        Self {
            envelope,
            chunk_size,
            done: false,
        }
    }
}

impl<S: ByteStore> Iterator for Chunks<'_, S> {
    type Item = EnvelopeResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.envelope.read(Some(self.chunk_size)) {
            Ok(chunk) if chunk.is_empty() => {
                self.done = true;
                None
            }
            Ok(chunk) => Some(Ok(chunk)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: ByteStore> std::iter::FusedIterator for Chunks<'_, S> {}
