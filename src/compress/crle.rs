// Compressed run-length encoding.
//
// The stream is a sequence of records:
//
//   0 <size n> <n raw bytes>       scattered
//   1 <size n> <byte>              repeated: `byte` n times
//
// Sizes use the patch size encoding. Runs shorter than `MIN_REPEATED`
// cost more as a repeated record than inline, so they stay scattered.

use crate::error::CodecError;
use crate::format::varint;

const KIND_SCATTERED: u8 = 0;
const KIND_REPEATED: u8 = 1;

/// Shortest run emitted as a repeated record.
const MIN_REPEATED: usize = 6;

/// Compress `data` into CRLE records.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + 8);
    let mut scattered_start = 0;
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        let run = data[i..].iter().take_while(|&&b| b == byte).count();
        if run >= MIN_REPEATED {
            emit_scattered(&mut out, &data[scattered_start..i]);
            out.push(KIND_REPEATED);
            push_size(&mut out, run);
            out.push(byte);
            i += run;
            scattered_start = i;
        } else {
            i += run;
        }
    }
    emit_scattered(&mut out, &data[scattered_start..]);
    out
}

/// Decompress CRLE records, producing exactly `expected_size` bytes.
pub fn decompress(data: &[u8], expected_size: usize) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(expected_size.min(1 << 24));
    let mut pos = 0;

    while pos < data.len() {
        let kind = data[pos];
        pos += 1;
        let (size, len) = varint::read_usize(&data[pos..]).map_err(CodecError::CrleSize)?;
        pos += len;
        if size > expected_size - out.len() {
            return Err(CodecError::SizeMismatch {
                expected: expected_size,
                actual: out.len().saturating_add(size),
            });
        }
        match kind {
            KIND_SCATTERED => {
                let end = pos.checked_add(size).ok_or(CodecError::CrleTruncated)?;
                let bytes = data.get(pos..end).ok_or(CodecError::CrleTruncated)?;
                out.extend_from_slice(bytes);
                pos = end;
            }
            KIND_REPEATED => {
                let &byte = data.get(pos).ok_or(CodecError::CrleTruncated)?;
                pos += 1;
                out.resize(out.len() + size, byte);
            }
            other => return Err(CodecError::CrleKind(other)),
        }
    }

    Ok(out)
}

fn emit_scattered(out: &mut Vec<u8>, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    out.push(KIND_SCATTERED);
    push_size(out, bytes.len());
    out.extend_from_slice(bytes);
}

fn push_size(out: &mut Vec<u8>, size: usize) {
    let mut buf = [0u8; varint::MAX_SIZE_LEN];
    let len = varint::encode_size(size as i64, &mut buf);
    out.extend_from_slice(&buf[..len]);
}
