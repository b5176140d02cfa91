// Patch reader: container bytes to decompressed streams and instructions.
//
// `PatchReader` walks the container:
//
//   HEADER -> STREAM_LENGTHS -> DECOMPRESS -> (REPLAY by the caller) -> DONE
//
// Any error is terminal. `InstructionReader` then walks the decompressed
// streams of one body or segment, checking every size against what is left.

use log::trace;

use super::Instruction;
use crate::compress::Compression;
use crate::error::{Error, Result};
use crate::format::varint::{self, SizeError};
use crate::format::{Header, InPlaceHeader};

// ---------------------------------------------------------------------------
// Container reader
// ---------------------------------------------------------------------------

/// The three decompressed streams of a patch body or segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Streams {
    pub control: Vec<u8>,
    pub diff: Vec<u8>,
    pub extra: Vec<u8>,
}

/// Compressed and decompressed size of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSizes {
    pub compressed: usize,
    pub uncompressed: usize,
}

/// Cursor over the bytes of a patch.
#[derive(Debug)]
pub struct PatchReader<'p> {
    data: &'p [u8],
    pos: usize,
}

impl<'p> PatchReader<'p> {
    pub fn new(data: &'p [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    fn remaining(&self) -> &'p [u8] {
        &self.data[self.pos..]
    }

    pub fn read_header(&mut self) -> Result<Header> {
        let (header, len) = Header::decode(self.remaining())?;
        self.pos += len;
        Ok(header)
    }

    /// Read the header and check it is of the expected type.
    pub fn read_header_of(&mut self, expected: u8) -> Result<Header> {
        let header = self.read_header()?;
        let actual = header.patch_type.id();
        if actual != expected {
            return Err(Error::UnexpectedPatchType { expected, actual });
        }
        Ok(header)
    }

    pub fn read_in_place_header(&mut self) -> Result<InPlaceHeader> {
        let (header, len) = InPlaceHeader::decode(self.remaining())?;
        self.pos += len;
        Ok(header)
    }

    /// Read one size varint that must not be negative.
    pub fn read_usize(&mut self) -> Result<usize> {
        let (value, len) = varint::read_usize(self.remaining())?;
        self.pos += len;
        Ok(value)
    }

    /// Read one block and decompress it.
    pub fn read_block(&mut self, compression: Compression) -> Result<Vec<u8>> {
        let (sizes, compressed) = self.read_raw_block()?;
        compression.decompress(compressed, sizes.uncompressed)
    }

    /// Read one block without decompressing it.
    pub fn read_raw_block(&mut self) -> Result<(BlockSizes, &'p [u8])> {
        let uncompressed = self.read_block_size()?;
        let compressed = self.read_block_size()?;
        let end = self
            .pos
            .checked_add(compressed)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::EarlyEndOfPatch)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        trace!("block: {compressed} compressed, {uncompressed} uncompressed bytes");
        Ok((
            BlockSizes {
                compressed,
                uncompressed,
            },
            bytes,
        ))
    }

    fn read_block_size(&mut self) -> Result<usize> {
        let (value, len) = varint::read_usize(self.remaining()).map_err(|e| match e {
            SizeError::FirstByte | SizeError::ConsecutiveByte => Error::EarlyEndOfPatch,
            other => Error::from(other),
        })?;
        self.pos += len;
        Ok(value)
    }

    /// Read and decompress the control, diff and extra blocks.
    pub fn read_streams(&mut self, compression: Compression) -> Result<Streams> {
        Ok(Streams {
            control: self.read_block(compression)?,
            diff: self.read_block(compression)?,
            extra: self.read_block(compression)?,
        })
    }

    /// Fail unless every byte of the patch has been consumed.
    pub fn finish(&self) -> Result<()> {
        if self.pos != self.data.len() {
            return Err(Error::EndOfPatchNotFound);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Instruction reader
// ---------------------------------------------------------------------------

/// Walks the decompressed streams of one body or segment.
#[derive(Debug)]
pub struct InstructionReader<'s> {
    control: &'s [u8],
    diff: &'s [u8],
    extra: &'s [u8],
    to_remaining: usize,
}

impl<'s> InstructionReader<'s> {
    /// `to_size` is the number of new bytes the streams must produce.
    pub fn new(streams: &'s Streams, to_size: usize) -> Self {
        Self {
            control: &streams.control,
            diff: &streams.diff,
            extra: &streams.extra,
            to_remaining: to_size,
        }
    }

    /// Next instruction, or `None` once the control stream is exhausted.
    pub fn next_instruction(&mut self) -> Result<Option<Instruction<'s>>> {
        if self.control.is_empty() {
            return Ok(None);
        }
        let diff_size = self.read_usize()?;
        let extra_size = self.read_usize()?;
        let (adjustment, len) = varint::read_size(self.control)?;
        self.control = &self.control[len..];

        if diff_size > self.to_remaining || diff_size > self.diff.len() {
            return Err(Error::DiffDataTooLong);
        }
        self.to_remaining -= diff_size;
        let (diff, rest) = self.diff.split_at(diff_size);
        self.diff = rest;

        if extra_size > self.to_remaining || extra_size > self.extra.len() {
            return Err(Error::ExtraDataTooLong);
        }
        self.to_remaining -= extra_size;
        let (extra, rest) = self.extra.split_at(extra_size);
        self.extra = rest;

        Ok(Some(Instruction::new(diff, extra, adjustment)))
    }

    fn read_usize(&mut self) -> Result<usize> {
        let (value, len) = varint::read_usize(self.control)?;
        self.control = &self.control[len..];
        Ok(value)
    }

    /// Fail unless the streams were consumed exactly.
    pub fn finish(&self) -> Result<()> {
        if self.to_remaining != 0 {
            return Err(Error::EarlyEndOfPatch);
        }
        if !self.control.is_empty() || !self.diff.is_empty() || !self.extra.is_empty() {
            return Err(Error::EndOfPatchNotFound);
        }
        Ok(())
    }
}

impl<'s> Iterator for InstructionReader<'s> {
    type Item = Result<Instruction<'s>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_instruction().transpose()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
