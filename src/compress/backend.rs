// Stream compression for the control, diff and extra streams.
//
// Each patch names one compression id in its header; all streams of the
// patch use it and are compressed independently:
//   ID 0 = none (identity)
//   ID 1 = LZMA (via lzma-rs, feature-gated `lzma`)
//   ID 2 = CRLE (run-length encoding, see `crle`)

use std::fmt;
use std::io;
use std::str::FromStr;

use super::crle;
use crate::error::{CodecError, Error, Result};

pub const COMPRESSION_NONE: u8 = 0;
pub const COMPRESSION_LZMA: u8 = 1;
pub const COMPRESSION_CRLE: u8 = 2;

type CodecResult<T> = std::result::Result<T, CodecError>;

// ---------------------------------------------------------------------------
// CompressBackend trait
// ---------------------------------------------------------------------------

/// One stream codec.
///
/// `decompress` receives the size recorded next to the compressed block so
/// codecs that know their output length can stop early on garbage; the
/// caller checks the final length either way.
pub trait CompressBackend {
    /// The compression id stored in the patch header.
    fn id(&self) -> u8;

    /// Compress one stream.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress one stream previously compressed by `compress()`.
    fn decompress(&self, data: &[u8], expected_size: usize) -> CodecResult<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// No-compression backend
// ---------------------------------------------------------------------------

/// Passthrough codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl CompressBackend for NoCompression {
    fn id(&self) -> u8 {
        COMPRESSION_NONE
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8], _expected_size: usize) -> CodecResult<Vec<u8>> {
        Ok(data.to_vec())
    }
}

// ---------------------------------------------------------------------------
// LZMA backend
// ---------------------------------------------------------------------------

/// LZMA ("lzma alone" container with end marker).
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaBackend;

#[cfg(feature = "lzma")]
impl CompressBackend for LzmaBackend {
    fn id(&self) -> u8 {
        COMPRESSION_LZMA
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut input = io::Cursor::new(data);
        let mut output = Vec::new();
        lzma_rs::lzma_compress(&mut input, &mut output)?;
        Ok(output)
    }

    fn decompress(&self, data: &[u8], expected_size: usize) -> CodecResult<Vec<u8>> {
        let mut input = io::BufReader::new(io::Cursor::new(data));
        let mut output = BoundedWriter {
            buf: Vec::with_capacity(expected_size.min(1 << 24)),
            limit: expected_size,
        };
        let options = lzma_rs::decompress::Options {
            memlimit: Some(expected_size.saturating_add(1 << 16)),
            ..Default::default()
        };
        lzma_rs::lzma_decompress_with_options(&mut input, &mut output, &options)
            .map_err(|e| CodecError::Lzma(e.to_string()))?;
        Ok(output.buf)
    }
}

/// Output sink that fails once more than `limit` bytes are written.
#[cfg(feature = "lzma")]
struct BoundedWriter {
    buf: Vec<u8>,
    limit: usize,
}

#[cfg(feature = "lzma")]
impl io::Write for BoundedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.len() > self.limit - self.buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "decompressed data exceeds the declared size",
            ));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(not(feature = "lzma"))]
impl CompressBackend for LzmaBackend {
    fn id(&self) -> u8 {
        COMPRESSION_LZMA
    }

    fn compress(&self, _data: &[u8]) -> io::Result<Vec<u8>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "LZMA compression requires the 'lzma' feature",
        ))
    }

    fn decompress(&self, _data: &[u8], _expected_size: usize) -> CodecResult<Vec<u8>> {
        Err(CodecError::Unsupported("lzma"))
    }
}

// ---------------------------------------------------------------------------
// CRLE backend
// ---------------------------------------------------------------------------

/// Run-length codec tuned for the zero runs of diff streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrleBackend;

impl CompressBackend for CrleBackend {
    fn id(&self) -> u8 {
        COMPRESSION_CRLE
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        Ok(crle::compress(data))
    }

    fn decompress(&self, data: &[u8], expected_size: usize) -> CodecResult<Vec<u8>> {
        crle::decompress(data, expected_size)
    }
}

// ---------------------------------------------------------------------------
// Compression selector
// ---------------------------------------------------------------------------

/// The compression algorithm of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    None,
    #[default]
    Lzma,
    Crle,
}

impl Compression {
    pub fn id(self) -> u8 {
        match self {
            Self::None => COMPRESSION_NONE,
            Self::Lzma => COMPRESSION_LZMA,
            Self::Crle => COMPRESSION_CRLE,
        }
    }

    /// Look up a compression by the id found in a patch header.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            COMPRESSION_NONE => Ok(Self::None),
            COMPRESSION_LZMA => Ok(Self::Lzma),
            COMPRESSION_CRLE => Ok(Self::Crle),
            other => Err(Error::UnknownCompression(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lzma => "lzma",
            Self::Crle => "crle",
        }
    }

    /// Compress one stream with this algorithm.
    pub fn compress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::None => NoCompression.compress(data),
            Self::Lzma => LzmaBackend.compress(data),
            Self::Crle => CrleBackend.compress(data),
        }
    }

    /// Decompress one stream and check it against its declared size.
    pub fn decompress(self, data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
        let output = match self {
            Self::None => NoCompression.decompress(data, expected_size),
            Self::Lzma => LzmaBackend.decompress(data, expected_size),
            Self::Crle => CrleBackend.decompress(data, expected_size),
        }?;
        if output.len() != expected_size {
            return Err(CodecError::SizeMismatch {
                expected: expected_size,
                actual: output.len(),
            }
            .into());
        }
        Ok(output)
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "lzma" => Ok(Self::Lzma),
            "crle" => Ok(Self::Crle),
            other => Err(Error::BadCompression(other.to_string())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
