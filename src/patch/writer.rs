// Stream encoder: instructions to the three compressed patch blocks.
//
// Instructions are split into a control stream (sizes and adjustments as
// size varints), a diff stream and an extra stream. `finish()` compresses
// each stream independently and writes it as a block:
//
//   size uncompressed_length, size compressed_length, bytes

use std::io::{self, Write};

use log::debug;

use super::Instruction;
use crate::compress::Compression;
use crate::format::varint;

/// Accumulates the streams of one patch body (or one in-place segment).
#[derive(Debug, Default)]
pub struct StreamEncoder {
    control: Vec<u8>,
    diff: Vec<u8>,
    extra: Vec<u8>,
    instructions: usize,
    to_size: usize,
}

impl StreamEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one instruction.
    pub fn push(&mut self, instruction: &Instruction<'_>) {
        let mut buf = [0u8; varint::MAX_SIZE_LEN];
        for value in [
            instruction.diff_size() as i64,
            instruction.extra_size() as i64,
            instruction.adjustment,
        ] {
            let len = varint::encode_size(value, &mut buf);
            self.control.extend_from_slice(&buf[..len]);
        }
        self.diff.extend_from_slice(&instruction.diff);
        self.extra.extend_from_slice(&instruction.extra);
        self.instructions += 1;
        self.to_size += instruction.to_size();
    }

    /// Append every instruction of an iterator, consuming it.
    pub fn extend<'a, I>(&mut self, instructions: I)
    where
        I: IntoIterator<Item = Instruction<'a>>,
    {
        for instruction in instructions {
            self.push(&instruction);
        }
    }

    /// Number of instructions pushed so far.
    pub fn instructions(&self) -> usize {
        self.instructions
    }

    /// Number of new bytes described so far.
    pub fn to_size(&self) -> usize {
        self.to_size
    }

    /// Compress and write the three blocks. Returns the bytes written.
    pub fn finish<W: Write>(self, compression: Compression, w: &mut W) -> io::Result<usize> {
        debug!(
            "writing {} instructions: control={} diff={} extra={} bytes ({compression})",
            self.instructions,
            self.control.len(),
            self.diff.len(),
            self.extra.len()
        );
        let mut written = 0;
        for stream in [&self.control, &self.diff, &self.extra] {
            written += write_block(w, compression, stream)?;
        }
        Ok(written)
    }
}

/// Compress `data` and write it as one length-prefixed block.
pub fn write_block<W: Write>(w: &mut W, compression: Compression, data: &[u8]) -> io::Result<usize> {
    let compressed = compression.compress(data)?;
    let mut header = Vec::with_capacity(2 * varint::MAX_SIZE_LEN);
    varint::write_usize(&mut header, data.len())?;
    varint::write_usize(&mut header, compressed.len())?;
    w.write_all(&header)?;
    w.write_all(&compressed)?;
    Ok(header.len() + compressed.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_extra_layout() {
        let to = [7u8; 100];
        let mut encoder = StreamEncoder::new();
        encoder.push(&Instruction {
            extra: (&to[..]).into(),
            ..Instruction::default()
        });
        assert_eq!(encoder.instructions(), 1);
        assert_eq!(encoder.to_size(), 100);

        let mut out = Vec::new();
        let written = encoder.finish(Compression::None, &mut out).unwrap();
        assert_eq!(written, out.len());

        let mut expected = vec![4, 4, 0x00, 0xA4, 0x01, 0x00];
        expected.extend_from_slice(&[0, 0]);
        expected.extend_from_slice(&[0xA4, 0x01, 0xA4, 0x01]);
        expected.extend_from_slice(&to);
        assert_eq!(out, expected);
    }

    #[test]
    fn negative_adjustments_are_encoded() {
        let mut encoder = StreamEncoder::new();
        encoder.push(&Instruction::new(vec![0u8; 2], &b""[..], -5));
        let mut out = Vec::new();
        encoder.finish(Compression::None, &mut out).unwrap();
        assert_eq!(&out[..5], &[3, 3, 2, 0, 0x45]);
    }

    #[test]
    fn compressed_blocks_record_both_lengths() {
        let mut encoder = StreamEncoder::new();
        encoder.push(&Instruction::new(vec![0u8; 4096], &b"tail"[..], 0));
        let mut out = Vec::new();
        encoder.finish(Compression::Crle, &mut out).unwrap();
        let (control_len, n) = varint::read_usize(&out).unwrap();
        assert_eq!(control_len, 4);
        let (compressed_len, m) = varint::read_usize(&out[n..]).unwrap();
        let diff_block = &out[n + m + compressed_len..];
        let (diff_len, _) = varint::read_usize(diff_block).unwrap();
        assert_eq!(diff_len, 4096);
    }
}
