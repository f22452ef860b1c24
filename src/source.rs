//! # Font Sources
//!
//! The subsetter reads the original font through a seekable byte source. The
//! source is a scoped resource: the pipeline reopens it when a request starts
//! and closes it when the request ends, on every exit path. [`SourceGuard`]
//! ties the close to `Drop` so an early `?` return cannot leak the handle.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// A seekable byte source over a raw sfnt font.
pub trait FontSource: Read + Seek {
    /// Identifier used in diagnostics, usually a file name.
    fn name(&self) -> &str;

    /// Make the source readable from the beginning of a request.
    fn reopen(&mut self) -> io::Result<()>;

    /// Release whatever `reopen` acquired. Must tolerate being called on a
    /// source that failed to reopen.
    fn close(&mut self);
}

/// A font read from a file on disk. The handle only lives for the duration
/// of a single subsetting request.
pub struct FileSource {
    path: PathBuf,
    name: String,
    file: Option<File>,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        FileSource {
            path,
            name,
            file: None,
        }
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "font file is not open")
        })
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read(buf)
    }
}

impl Seek for FileSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file()?.seek(pos)
    }
}

impl FontSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn reopen(&mut self) -> io::Result<()> {
        self.file = Some(File::open(&self.path)?);
        Ok(())
    }

    fn close(&mut self) {
        self.file = None;
    }
}

/// Adapts any caller-owned `Read + Seek` (an in-memory cursor, a region of
/// a larger container) into a [`FontSource`]. Reopening rewinds; closing
/// leaves the reader to its owner.
pub struct ReaderSource<R> {
    name: String,
    inner: R,
}

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(name: impl Into<String>, inner: R) -> Self {
        ReaderSource {
            name: name.into(),
            inner,
        }
    }
}

impl<R: Read + Seek> Read for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Seek> Seek for ReaderSource<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<R: Read + Seek> FontSource for ReaderSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn reopen(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn close(&mut self) {}
}

/// Holds a reopened source for the length of one request and closes it
/// exactly once when dropped.
pub struct SourceGuard<'a, S: FontSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: FontSource + ?Sized> SourceGuard<'a, S> {
    /// Reopen `source`. If reopening fails the guard is already live, so the
    /// source is still closed before the error is returned.
    pub fn open(source: &'a mut S) -> io::Result<Self> {
        let mut guard = SourceGuard { source };
        guard.source.reopen()?;
        Ok(guard)
    }
}

impl<S: FontSource + ?Sized> Deref for SourceGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.source
    }
}

impl<S: FontSource + ?Sized> DerefMut for SourceGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.source
    }
}

impl<S: FontSource + ?Sized> Drop for SourceGuard<'_, S> {
    fn drop(&mut self) {
        log::trace!("closing font source {}", self.source.name());
        self.source.close();
    }
}
