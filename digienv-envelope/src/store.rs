//! Byte stores an envelope can own.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// Seekable, readable, appendable byte container holding envelope ciphertext.
///
/// Implemented for in-memory buffers and files. Custom stream abstractions
/// implement [`ByteStore::set_len`] on top of `Read + Write + Seek`.
pub trait ByteStore: Read + Write + Seek {
    /// Truncates or zero-extends the store to `len` bytes without moving the cursor.
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl ByteStore for Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "store length overflow"))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

impl ByteStore for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

impl<T: ByteStore + ?Sized> ByteStore for &mut T {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }
}

/// Default in-memory store.
pub type MemoryStore = Cursor<Vec<u8>>;

/// Store bytes a pending mutation will overwrite, kept so it can be undone.
#[derive(Debug)]
pub(crate) struct Snapshot {
    start: u64,
    bytes: Vec<u8>,
    len: u64,
}

impl Snapshot {
    /// Saves up to `count` bytes at `start` and the store length.
    ///
    /// Leaves the cursor at `start`.
    pub(crate) fn capture<S: ByteStore>(
        store: &mut S,
        start: u64,
        count: u64,
    ) -> io::Result<Self> {
        let len = store.seek(SeekFrom::End(0))?;
        store.seek(SeekFrom::Start(start))?;
        let mut bytes = Vec::new();
        Read::by_ref(store).take(count).read_to_end(&mut bytes)?;
        store.seek(SeekFrom::Start(start))?;
        Ok(Self { start, bytes, len })
    }

    /// The saved bytes, as they were before the mutation.
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Writes the saved bytes back and restores the store length.
    ///
    /// Leaves the cursor at the snapshot start.
    pub(crate) fn restore<S: ByteStore>(&self, store: &mut S) -> io::Result<()> {
        store.seek(SeekFrom::Start(self.start))?;
        store.write_all(&self.bytes)?;
        store.set_len(self.len)?;
        store.seek(SeekFrom::Start(self.start))?;
        Ok(())
    }
}
