// Signed variable-length size encoding.
//
// First byte:     C S x x x x x x   (C = continuation, S = sign, 6 value bits)
// Following bytes: C x x x x x x x  (7 value bits each)
//
// Value groups are little-endian: least significant bits come first.
// The magnitude is stored, not a two's complement, so negative values cost
// the same as positive ones.

use std::io::{self, Write};

use thiserror::Error;

/// Maximum encoded length for a 64-bit magnitude (6 + 9 * 7 >= 64).
pub const MAX_SIZE_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const SIGN: u8 = 0x40;
const FIRST_MASK: u8 = 0x3F;
const NEXT_MASK: u8 = 0x7F;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `value` into `buf`, returning the number of bytes used (1..=10).
#[inline]
pub fn encode_size(value: i64, buf: &mut [u8; MAX_SIZE_LEN]) -> usize {
    let mut magnitude = value.unsigned_abs();
    let mut byte = (magnitude as u8) & FIRST_MASK;
    if value < 0 {
        byte |= SIGN;
    }
    magnitude >>= 6;

    let mut len = 0;
    loop {
        if magnitude > 0 {
            byte |= CONTINUATION;
        }
        buf[len] = byte;
        len += 1;
        if magnitude == 0 {
            return len;
        }
        byte = (magnitude as u8) & NEXT_MASK;
        magnitude >>= 7;
    }
}

/// Encode a signed size and write it to a `Write` sink.
pub fn write_size<W: Write>(w: &mut W, value: i64) -> io::Result<()> {
    let mut buf = [0u8; MAX_SIZE_LEN];
    let len = encode_size(value, &mut buf);
    w.write_all(&buf[..len])
}

/// Encode an unsigned size and write it to a `Write` sink.
pub fn write_usize<W: Write>(w: &mut W, value: usize) -> io::Result<()> {
    let value = i64::try_from(value)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "size overflow"))?;
    write_size(w, value)
}

// ---------------------------------------------------------------------------
// Decoding from byte slices
// ---------------------------------------------------------------------------

/// Decode a signed size from the start of `data`.
/// Returns `(value, bytes_consumed)`.
pub fn read_size(data: &[u8]) -> Result<(i64, usize), SizeError> {
    let Some(&first) = data.first() else {
        return Err(SizeError::FirstByte);
    };
    let negative = first & SIGN != 0;
    let mut magnitude = u64::from(first & FIRST_MASK);
    let mut shift = 6u32;
    let mut len = 1;
    let mut byte = first;

    while byte & CONTINUATION != 0 {
        byte = *data.get(len).ok_or(SizeError::ConsecutiveByte)?;
        len += 1;
        let group = u64::from(byte & NEXT_MASK);
        if shift >= 64 || (group << shift) >> shift != group {
            return Err(SizeError::Overflow);
        }
        magnitude |= group << shift;
        shift += 7;
    }

    let value = if negative {
        if magnitude > i64::MIN.unsigned_abs() {
            return Err(SizeError::Overflow);
        }
        (magnitude as i64).wrapping_neg()
    } else {
        i64::try_from(magnitude).map_err(|_| SizeError::Overflow)?
    };
    Ok((value, len))
}

/// Decode a size that must not be negative.
pub fn read_usize(data: &[u8]) -> Result<(usize, usize), SizeError> {
    let (value, len) = read_size(data)?;
    if value < 0 {
        return Err(SizeError::Negative(value));
    }
    let value = usize::try_from(value).map_err(|_| SizeError::Overflow)?;
    Ok((value, len))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Return the encoded byte-length of `value`.
#[inline]
pub fn sizeof_size(value: i64) -> usize {
    let bits = 64 - value.unsigned_abs().leading_zeros() as usize;
    if bits <= 6 {
        1
    } else {
        1 + (bits - 6).div_ceil(7)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SizeError {
    /// No byte left for the start of the size.
    #[error("failed to read first size byte")]
    FirstByte,
    /// The continuation bit promised another byte that is not there.
    #[error("failed to read consecutive size byte")]
    ConsecutiveByte,
    /// More than 64 bits of magnitude.
    #[error("size overflow")]
    Overflow,
    /// A negative value where only sizes are allowed.
    #[error("negative size {0}")]
    Negative(i64),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
