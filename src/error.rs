// Error type shared by the differ, writer, reader and reporter.
//
// Every failure is fatal to the call that raised it. Display strings are
// part of the public surface: the CLI prints them verbatim.

use std::io;

use thiserror::Error;

use crate::format::varint::SizeError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of one of the compression codecs while decoding a stream.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("lzma: {0}")]
    Lzma(String),
    #[error("crle: expected kind scattered(0) or repeated(1), but got {0}")]
    CrleKind(u8),
    #[error("crle: truncated record")]
    CrleTruncated,
    #[error("crle: {0}")]
    CrleSize(SizeError),
    #[error("decompressed {actual} bytes, but {expected} were declared")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("{0} support is not compiled in")]
    Unsupported(&'static str),
}

#[derive(Debug, Error)]
pub enum Error {
    // -- Patch structure --------------------------------------------------
    #[error("Failed to read the patch header.")]
    PatchHeader,
    #[error("End of patch not found.")]
    EndOfPatchNotFound,
    #[error("Early end of patch data.")]
    EarlyEndOfPatch,
    #[error("Patch diff data too long.")]
    DiffDataTooLong,
    #[error("Patch extra data too long.")]
    ExtraDataTooLong,
    #[error("Patch from data out of range.")]
    FromDataOutOfRange,
    #[error("Expected patch type {expected}, but got {actual}.")]
    UnexpectedPatchType { expected: u8, actual: u8 },
    #[error("Expected patch type normal(0) or in-place(1), but got {0}.")]
    UnknownPatchType(u8),
    #[error("Expected compression none(0), lzma(1) or crle(2), but got {0}.")]
    UnknownCompression(u8),
    #[error("Bad in-place patch parameters.")]
    InPlaceParameters,

    // -- Size encoding ----------------------------------------------------
    #[error("Failed to read first size byte.")]
    FirstSizeByte,
    #[error("Failed to read consecutive size byte.")]
    ConsecutiveSizeByte,
    #[error("Size does not fit in 64 bits.")]
    SizeOverflow,
    #[error("Expected a non-negative size, but got {0}.")]
    NegativeSize(i64),

    // -- Compression --------------------------------------------------------
    #[error("Patch decompression failed.")]
    Decompression(#[source] CodecError),

    // -- Configuration --------------------------------------------------------
    #[error("Bad patch type '{0}'.")]
    BadPatchType(String),
    #[error("Expected compression crle, lzma or none, but got {0}.")]
    BadCompression(String),
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<SizeError> for Error {
    fn from(e: SizeError) -> Self {
        match e {
            SizeError::FirstByte => Self::FirstSizeByte,
            SizeError::ConsecutiveByte => Self::ConsecutiveSizeByte,
            SizeError::Overflow => Self::SizeOverflow,
            SizeError::Negative(value) => Self::NegativeSize(value),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Decompression(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_verbatim() {
        assert_eq!(
            Error::UnexpectedPatchType {
                expected: 0,
                actual: 1
            }
            .to_string(),
            "Expected patch type 0, but got 1."
        );
        assert_eq!(
            Error::UnknownCompression(7).to_string(),
            "Expected compression none(0), lzma(1) or crle(2), but got 7."
        );
        assert_eq!(
            Error::BadPatchType("bad".into()).to_string(),
            "Bad patch type 'bad'."
        );
        assert_eq!(
            Error::BadCompression("zip".into()).to_string(),
            "Expected compression crle, lzma or none, but got zip."
        );
    }

    #[test]
    fn size_errors_convert() {
        assert_eq!(
            Error::from(SizeError::FirstByte).to_string(),
            "Failed to read first size byte."
        );
        assert_eq!(
            Error::from(SizeError::ConsecutiveByte).to_string(),
            "Failed to read consecutive size byte."
        );
    }

    #[test]
    fn decompression_keeps_source() {
        let e = Error::from(CodecError::CrleTruncated);
        assert_eq!(e.to_string(), "Patch decompression failed.");
        let source = std::error::Error::source(&e).unwrap();
        assert_eq!(source.to_string(), "crle: truncated record");
    }
}
