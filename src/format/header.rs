// Patch header encoding/decoding.
//
// Every patch starts with two bytes: the patch type and the compression id.
// Normal patches follow with the to size; in-place patches with the memory
// layout they were planned for.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use super::varint;
use crate::compress::Compression;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Patch type ids
// ---------------------------------------------------------------------------

pub const PATCH_TYPE_NORMAL: u8 = 0;
pub const PATCH_TYPE_IN_PLACE: u8 = 1;

/// Length of the fixed part of every header.
pub const HEADER_LEN: usize = 2;

/// Kind of patch stored in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchType {
    /// Output goes to a fresh sink; old data is read-only.
    #[default]
    Normal,
    /// Old data is overwritten segment by segment inside one memory region.
    InPlace,
}

impl PatchType {
    pub fn id(self) -> u8 {
        match self {
            Self::Normal => PATCH_TYPE_NORMAL,
            Self::InPlace => PATCH_TYPE_IN_PLACE,
        }
    }

    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            PATCH_TYPE_NORMAL => Ok(Self::Normal),
            PATCH_TYPE_IN_PLACE => Ok(Self::InPlace),
            other => Err(Error::UnknownPatchType(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::InPlace => "in-place",
        }
    }
}

impl FromStr for PatchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "in-place" => Ok(Self::InPlace),
            other => Err(Error::BadPatchType(other.to_string())),
        }
    }
}

impl fmt::Display for PatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Common header
// ---------------------------------------------------------------------------

/// The two leading bytes of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub patch_type: PatchType,
    pub compression: Compression,
}

impl Header {
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[self.patch_type.id(), self.compression.id()])
    }

    /// Decode the header from the start of `data`.
    ///
    /// The patch type is checked before the compression id, so a patch
    /// with both bytes corrupted reports the type.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < HEADER_LEN {
            return Err(Error::PatchHeader);
        }
        let patch_type = PatchType::from_id(data[0])?;
        let compression = Compression::from_id(data[1])?;
        Ok((
            Self {
                patch_type,
                compression,
            },
            HEADER_LEN,
        ))
    }
}

// ---------------------------------------------------------------------------
// In-place header
// ---------------------------------------------------------------------------

/// Memory layout fields of an in-place patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InPlaceHeader {
    pub memory_size: usize,
    pub segment_size: usize,
    pub shift_size: usize,
    /// Old data used by the patch, after truncation to the memory region.
    pub from_size: usize,
    pub to_size: usize,
}

impl InPlaceHeader {
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        varint::write_usize(w, self.memory_size)?;
        varint::write_usize(w, self.segment_size)?;
        varint::write_usize(w, self.shift_size)?;
        varint::write_usize(w, self.from_size)?;
        varint::write_usize(w, self.to_size)
    }

    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut pos = 0;
        let mut next = || -> Result<usize> {
            let (value, len) = varint::read_usize(&data[pos..])?;
            pos += len;
            Ok(value)
        };
        let header = Self {
            memory_size: next()?,
            segment_size: next()?,
            shift_size: next()?,
            from_size: next()?,
            to_size: next()?,
        };
        Ok((header, pos))
    }

    /// Number of segments the to data is split into.
    pub fn number_of_segments(&self) -> usize {
        if self.segment_size == 0 {
            0
        } else {
            self.to_size.div_ceil(self.segment_size)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
