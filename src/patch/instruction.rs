// Instruction model shared by the differ, the writer and the reader.

use std::borrow::Cow;

/// One step of the delta program.
///
/// Replaying it reads `diff.len()` bytes of old data at the cursor, adds
/// the diff bytes modulo 256, appends `extra` verbatim, then moves the
/// cursor by `diff.len() + adjustment`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Instruction<'a> {
    /// New minus old, byte-wise modulo 256.
    pub diff: Cow<'a, [u8]>,
    /// Literal new bytes.
    pub extra: Cow<'a, [u8]>,
    /// Signed cursor adjustment applied after the diff bytes.
    pub adjustment: i64,
}

impl<'a> Instruction<'a> {
    pub fn new(diff: impl Into<Cow<'a, [u8]>>, extra: impl Into<Cow<'a, [u8]>>, adjustment: i64) -> Self {
        Self {
            diff: diff.into(),
            extra: extra.into(),
            adjustment,
        }
    }

    /// An instruction that only moves the cursor.
    pub fn seek(adjustment: i64) -> Self {
        Self {
            adjustment,
            ..Self::default()
        }
    }

    #[inline]
    pub fn diff_size(&self) -> usize {
        self.diff.len()
    }

    #[inline]
    pub fn extra_size(&self) -> usize {
        self.extra.len()
    }

    /// Number of new bytes this instruction produces.
    #[inline]
    pub fn to_size(&self) -> usize {
        self.diff.len() + self.extra.len()
    }

    /// True for an instruction that only moves the cursor.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diff.is_empty() && self.extra.is_empty()
    }
}
