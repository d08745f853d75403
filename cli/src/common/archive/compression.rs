//! # tarx Compression Adapter (`common::archive::compression`)
//!
//! File: cli/src/common/archive/compression.rs
//!
//! ## Overview
//!
//! This module decides, purely from the archive's file name, whether a gzip
//! layer sits between the archive file and the tar serializer/parser. Names
//! ending in `.gz` or `.gzip` are gzip-compressed; everything else is a plain
//! tar stream. The content of the file is never inspected.
//!
//! ## Architecture
//!
//! - `Compression`: the decision (`None` or `Gzip`), made by `from_path`.
//! - `ArchiveSink`: the writable stream handed to `tar::Builder`. Either a
//!   buffered file or a `flate2` gzip encoder over a buffered file. Its
//!   `finish` closes the layers in order (gzip trailer, then buffer flush).
//! - `ArchiveSource`: the readable stream handed to `tar::Archive`. Either a
//!   buffered file or a multi-member gzip decoder over it. Read failures of
//!   the file itself are tagged with `SourceReadError`, so the reader can
//!   tell them apart from malformed content reported by `tar` or `flate2`.
//!
//! Once a sink or source is built, the tar layer above it does not know or
//! care whether compression is in play.
//!
//! ## Usage
//!
//! ```rust
//! let compression = Compression::from_path(Path::new("out.tar.gz"));
//! let sink = compression.wrap_writer(File::create("out.tar.gz")?, 6);
//! let mut builder = tar::Builder::new(sink);
//! // ... append entries ...
//! let sink = builder.into_inner()?;
//! let _file = sink.finish()?;
//! ```
//!
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Suffixes that mark an archive name as gzip-compressed.
const GZIP_SUFFIXES: [&str; 2] = [".gz", ".gzip"];

/// Compression layer selected for an archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Raw tar stream.
    None,
    /// The whole tar stream is one gzip stream.
    Gzip,
}

impl Compression {
    /// Selects the compression layer from the final component of `path`.
    pub fn from_path(path: &Path) -> Self {
        let is_gzip = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .is_some_and(|name| GZIP_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)));
        if is_gzip {
            Compression::Gzip
        } else {
            Compression::None
        }
    }

    /// Wraps a freshly created archive file for writing.
    pub fn wrap_writer(self, file: File, level: u32) -> ArchiveSink {
        let buffered = BufWriter::new(file);
        match self {
            Compression::None => ArchiveSink::Plain(buffered),
            Compression::Gzip => ArchiveSink::Gzip(GzEncoder::new(
                buffered,
                flate2::Compression::new(level),
            )),
        }
    }

    /// Wraps an opened archive file for reading.
    pub fn wrap_reader(self, file: File) -> ArchiveSource {
        let buffered = BufReader::new(SourceFile(file));
        match self {
            Compression::None => ArchiveSource::Plain(buffered),
            Compression::Gzip => ArchiveSource::Gzip(MultiGzDecoder::new(buffered)),
        }
    }
}

/// Output stream of an archive being written.
pub enum ArchiveSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl ArchiveSink {
    /// Closes the compression layer (if any) and flushes the buffer,
    /// returning the underlying file. The first failure is returned.
    pub fn finish(self) -> io::Result<File> {
        let buffered = match self {
            ArchiveSink::Plain(buffered) => buffered,
            ArchiveSink::Gzip(encoder) => encoder.finish()?,
        };
        buffered.into_inner().map_err(|e| e.into_error())
    }
}

impl Write for ArchiveSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ArchiveSink::Plain(w) => w.write(buf),
            ArchiveSink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ArchiveSink::Plain(w) => w.flush(),
            ArchiveSink::Gzip(w) => w.flush(),
        }
    }
}

/// An I/O failure of the archive file itself, as opposed to bad content.
#[derive(Debug, Error)]
#[error("failed to read archive file: {0}")]
pub struct SourceReadError(#[source] io::Error);

impl SourceReadError {
    /// Wraps `e` so that it keeps its kind (retry on `Interrupted` still works).
    pub fn tag(e: io::Error) -> io::Error {
        io::Error::new(e.kind(), SourceReadError(e))
    }
}

/// Archive file whose read errors carry a `SourceReadError` payload.
pub struct SourceFile(File);

impl Read for SourceFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).map_err(SourceReadError::tag)
    }
}

/// Input stream of an archive being read.
pub enum ArchiveSource {
    Plain(BufReader<SourceFile>),
    Gzip(MultiGzDecoder<BufReader<SourceFile>>),
}

impl Read for ArchiveSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ArchiveSource::Plain(r) => r.read(buf),
            ArchiveSource::Gzip(r) => r.read(buf),
        }
    }
}
