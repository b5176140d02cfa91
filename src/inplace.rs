// In-place segmentation planner.
//
// An in-place patch rewrites old data into new data inside one memory
// region of `memory_size` bytes. The old data is first moved up by
// `shift_size`, then the new data is produced segment by segment from the
// start of the region:
//
//   memory  [ seg 0 | seg 1 | ... ]
//                   [ shift | old data ............ ]
//
// Segment i writes [i * seg, (i + 1) * seg) and may only read old data at
// or above (i + 1) * seg, so a write never clobbers bytes a later segment
// reads. The writer and the applier build the same plan.

use std::ops::Range;

use log::debug;

use crate::error::{Error, Result};
use crate::format::InPlaceHeader;

/// Smallest encoding of one segment: three empty blocks of two size bytes.
pub const MIN_SEGMENT_LEN: usize = 6;

/// Memory layout of an in-place patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InPlacePlan {
    pub memory_size: usize,
    pub segment_size: usize,
    pub shift_size: usize,
    /// Old data used, after truncation to `memory_size - shift_size`.
    pub from_size: usize,
    pub to_size: usize,
}

/// One segment of an in-place patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    /// Memory range written by this segment.
    pub to: Range<usize>,
    /// Memory range holding the old data this segment may read. Either
    /// empty or starting at or above `to.end`.
    pub from: Range<usize>,
}

impl Segment {
    /// The readable window as a range of the (unshifted) old data.
    pub fn from_data_range(&self, shift_size: usize) -> Range<usize> {
        self.from.start - shift_size..self.from.end - shift_size
    }
}

/// Default minimum shift for a segment size.
pub fn default_minimum_shift_size(memory_size: usize, segment_size: usize) -> usize {
    segment_size.saturating_mul(2).min(memory_size)
}

impl InPlacePlan {
    /// Plan a patch from `from_size` old bytes to `to_size` new bytes.
    pub fn new(
        from_size: usize,
        to_size: usize,
        memory_size: usize,
        segment_size: usize,
        minimum_shift_size: Option<usize>,
    ) -> Result<Self> {
        if segment_size == 0 {
            return Err(Error::Config("Segment size must be greater than zero.".into()));
        }
        if memory_size < segment_size {
            return Err(Error::Config(format!(
                "Memory size {memory_size} is smaller than segment size {segment_size}."
            )));
        }
        if to_size > memory_size {
            return Err(Error::Config(format!(
                "To data of {to_size} bytes does not fit in memory of {memory_size} bytes."
            )));
        }
        let minimum_shift_size = minimum_shift_size
            .unwrap_or_else(|| default_minimum_shift_size(memory_size, segment_size));
        if minimum_shift_size > memory_size {
            return Err(Error::Config(format!(
                "Minimum shift size {minimum_shift_size} is larger than memory size {memory_size}."
            )));
        }

        let memory_segments = memory_size.div_ceil(segment_size);
        let from_segments = from_size.div_ceil(segment_size);
        let shift_size = memory_segments
            .saturating_sub(from_segments)
            .saturating_mul(segment_size)
            .max(minimum_shift_size)
            .min(memory_size);
        let from_size = from_size.min(memory_size - shift_size);

        let plan = Self {
            memory_size,
            segment_size,
            shift_size,
            from_size,
            to_size,
        };
        debug!(
            "in-place plan: memory={memory_size} segment={segment_size} shift={shift_size} \
             from={from_size} to={to_size} segments={}",
            plan.number_of_segments()
        );
        Ok(plan)
    }

    /// Rebuild and check the plan stored in a patch header.
    ///
    /// `available` is the number of patch bytes following the header. Every
    /// segment takes at least `MIN_SEGMENT_LEN` of them.
    pub fn from_header(header: &InPlaceHeader, available: usize) -> Result<Self> {
        let plan = Self {
            memory_size: header.memory_size,
            segment_size: header.segment_size,
            shift_size: header.shift_size,
            from_size: header.from_size,
            to_size: header.to_size,
        };
        let fits = plan.segment_size > 0
            && plan.memory_size >= plan.segment_size
            && plan.to_size <= plan.memory_size
            && plan.shift_size <= plan.memory_size
            && plan.from_size <= plan.memory_size - plan.shift_size
            && plan.number_of_segments() <= available / MIN_SEGMENT_LEN;
        if !fits {
            return Err(Error::InPlaceParameters);
        }
        Ok(plan)
    }

    pub fn header(&self) -> InPlaceHeader {
        InPlaceHeader {
            memory_size: self.memory_size,
            segment_size: self.segment_size,
            shift_size: self.shift_size,
            from_size: self.from_size,
            to_size: self.to_size,
        }
    }

    pub fn number_of_segments(&self) -> usize {
        self.to_size.div_ceil(self.segment_size)
    }

    /// Segment `index`, which must be below `number_of_segments()`.
    pub fn segment(&self, index: usize) -> Segment {
        let to_start = index * self.segment_size;
        let to_end = to_start.saturating_add(self.segment_size).min(self.to_size);
        let from_end = self.shift_size + self.from_size;
        let from_start = to_start
            .saturating_add(self.segment_size)
            .max(self.shift_size)
            .min(self.memory_size);
        Segment {
            index,
            to: to_start..to_end,
            from: from_start.min(from_end)..from_end,
        }
    }

    /// All segments in apply order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.number_of_segments()).map(|index| self.segment(index))
    }
}
