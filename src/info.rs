// Patch info: statistics over a patch without applying it.

use std::fmt::Write as _;
use std::ops::Range;

use crate::compress::Compression;
use crate::error::Result;
use crate::format::PatchType;
use crate::inplace::InPlacePlan;
use crate::patch::{InstructionReader, PatchReader, Streams};

const LABEL_WIDTH: usize = 20;

// ---------------------------------------------------------------------------
// Structured info
// ---------------------------------------------------------------------------

/// Instruction statistics of one body or segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamInfo {
    /// Diff size of every instruction, in order.
    pub diff_sizes: Vec<usize>,
    /// Extra size of every instruction, in order.
    pub extra_sizes: Vec<usize>,
    /// Decompressed size of the control stream.
    pub control_size: usize,
}

impl StreamInfo {
    fn read(streams: &Streams, to_size: usize) -> Result<Self> {
        let mut info = Self {
            control_size: streams.control.len(),
            ..Self::default()
        };
        let mut instructions = InstructionReader::new(streams, to_size);
        while let Some(instruction) = instructions.next_instruction()? {
            info.diff_sizes.push(instruction.diff_size());
            info.extra_sizes.push(instruction.extra_size());
        }
        instructions.finish()?;
        Ok(info)
    }

    fn merge(&mut self, other: &StreamInfo) {
        self.diff_sizes.extend_from_slice(&other.diff_sizes);
        self.extra_sizes.extend_from_slice(&other.extra_sizes);
        self.control_size += other.control_size;
    }

    pub fn number_of_diffs(&self) -> usize {
        self.diff_sizes.len()
    }

    pub fn number_of_extras(&self) -> usize {
        self.extra_sizes.len()
    }

    pub fn diff_size(&self) -> usize {
        self.diff_sizes.iter().sum()
    }

    pub fn extra_size(&self) -> usize {
        self.extra_sizes.iter().sum()
    }

    pub fn average_diff_size(&self) -> Option<usize> {
        average(&self.diff_sizes)
    }

    pub fn average_extra_size(&self) -> Option<usize> {
        average(&self.extra_sizes)
    }

    pub fn median_diff_size(&self) -> Option<usize> {
        median(&self.diff_sizes)
    }

    pub fn median_extra_size(&self) -> Option<usize> {
        median(&self.extra_sizes)
    }

    /// Diff bytes relative to extra bytes, in percent.
    pub fn diff_extra_ratio(&self) -> f64 {
        ratio(self.diff_size(), self.extra_size())
    }

    /// Control bytes relative to diff and extra bytes, in percent.
    pub fn size_data_ratio(&self) -> f64 {
        ratio(self.control_size, self.diff_size() + self.extra_size())
    }
}

/// One segment of an in-place patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInfo {
    pub index: usize,
    pub from: Range<usize>,
    pub to: Range<usize>,
    pub streams: StreamInfo,
}

/// In-place layout.
#[derive(Debug, Clone, PartialEq)]
pub struct InPlaceInfo {
    pub memory_size: usize,
    pub segment_size: usize,
    pub shift_size: usize,
    pub from_size: usize,
    pub segments: Vec<SegmentInfo>,
}

/// Everything `patch_info` reports.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchInfo {
    pub patch_type: PatchType,
    pub compression: Compression,
    pub patch_size: usize,
    pub to_size: usize,
    /// All instructions of the patch.
    pub streams: StreamInfo,
    pub in_place: Option<InPlaceInfo>,
}

impl PatchInfo {
    /// Patch size relative to to size, in percent.
    pub fn patch_to_ratio(&self) -> f64 {
        ratio(self.patch_size, self.to_size)
    }
}

/// Parse `patch` and collect its statistics.
pub fn read_patch_info(patch: &[u8]) -> Result<PatchInfo> {
    let mut reader = PatchReader::new(patch);
    let header = reader.read_header()?;

    let info = match header.patch_type {
        PatchType::Normal => {
            let to_size = reader.read_usize()?;
            let streams = if to_size > 0 {
                StreamInfo::read(&reader.read_streams(header.compression)?, to_size)?
            } else {
                StreamInfo::default()
            };
            PatchInfo {
                patch_type: header.patch_type,
                compression: header.compression,
                patch_size: patch.len(),
                to_size,
                streams,
                in_place: None,
            }
        }
        PatchType::InPlace => {
            let plan = InPlacePlan::from_header(
                &reader.read_in_place_header()?,
                reader.remaining_len(),
            )?;
            let mut streams = StreamInfo::default();
            let mut segments = Vec::with_capacity(plan.number_of_segments());
            for segment in plan.segments() {
                let decoded = reader.read_streams(header.compression)?;
                let segment_streams = StreamInfo::read(&decoded, segment.to.len())?;
                streams.merge(&segment_streams);
                segments.push(SegmentInfo {
                    index: segment.index,
                    from: segment.from,
                    to: segment.to,
                    streams: segment_streams,
                });
            }
            PatchInfo {
                patch_type: header.patch_type,
                compression: header.compression,
                patch_size: patch.len(),
                to_size: plan.to_size,
                streams,
                in_place: Some(InPlaceInfo {
                    memory_size: plan.memory_size,
                    segment_size: plan.segment_size,
                    shift_size: plan.shift_size,
                    from_size: plan.from_size,
                    segments,
                }),
            }
        }
    };

    reader.finish()?;
    Ok(info)
}

// ---------------------------------------------------------------------------
// Text report
// ---------------------------------------------------------------------------

/// Human readable report of `patch`.
pub fn patch_info(patch: &[u8], human: bool) -> Result<String> {
    Ok(format_patch_info(&read_patch_info(patch)?, human))
}

/// Render collected statistics.
pub fn format_patch_info(info: &PatchInfo, human: bool) -> String {
    let size = |n: usize| format_size(n, human);
    let mut out = String::new();

    line(&mut out, "Type:", info.patch_type.name());
    line(&mut out, "Patch size:", &size(info.patch_size));
    if let Some(in_place) = &info.in_place {
        line(&mut out, "Memory size:", &size(in_place.memory_size));
        line(&mut out, "Segment size:", &size(in_place.segment_size));
        line(&mut out, "Shift size:", &size(in_place.shift_size));
        line(&mut out, "From size:", &size(in_place.from_size));
    }
    line(&mut out, "To size:", &size(info.to_size));
    line(
        &mut out,
        "Patch/to ratio:",
        &format_ratio(info.patch_to_ratio(), "lower"),
    );
    ratios(&mut out, &info.streams);
    line(&mut out, "Compression:", info.compression.name());
    if let Some(in_place) = &info.in_place {
        line(
            &mut out,
            "Number of segments:",
            &in_place.segments.len().to_string(),
        );
    }
    out.push('\n');
    breakdown(&mut out, &info.streams, human);

    if let Some(in_place) = &info.in_place {
        for segment in &in_place.segments {
            let _ = writeln!(
                out,
                "\n------------------- Segment {} -------------------\n",
                segment.index + 1
            );
            line(
                &mut out,
                "From range:",
                &format!("{} - {}", size(segment.from.start), size(segment.from.end)),
            );
            line(
                &mut out,
                "To range:",
                &format!("{} - {}", size(segment.to.start), size(segment.to.end)),
            );
            ratios(&mut out, &segment.streams);
            out.push('\n');
            breakdown(&mut out, &segment.streams, human);
        }
    }

    out
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{label:<width$}{value}", width = LABEL_WIDTH);
}

fn ratios(out: &mut String, streams: &StreamInfo) {
    line(
        out,
        "Diff/extra ratio:",
        &format_ratio(streams.diff_extra_ratio(), "higher"),
    );
    line(
        out,
        "Size/data ratio:",
        &format_ratio(streams.size_data_ratio(), "lower"),
    );
}

fn breakdown(out: &mut String, streams: &StreamInfo, human: bool) {
    let optional = |n: Option<usize>| n.map_or_else(|| "-".to_string(), |n| format_size(n, human));

    line(out, "Number of diffs:", &streams.number_of_diffs().to_string());
    line(out, "Total diff size:", &format_size(streams.diff_size(), human));
    line(out, "Average diff size:", &optional(streams.average_diff_size()));
    line(out, "Median diff size:", &optional(streams.median_diff_size()));
    out.push('\n');
    line(out, "Number of extras:", &streams.number_of_extras().to_string());
    line(out, "Total extra size:", &format_size(streams.extra_size(), human));
    line(out, "Average extra size:", &optional(streams.average_extra_size()));
    line(out, "Median extra size:", &optional(streams.median_extra_size()));
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Format a byte count, in binary units when `human` is set.
pub fn format_size(size: usize, human: bool) -> String {
    if !human || size < 1024 {
        return if size == 1 && human {
            "1 byte".to_string()
        } else {
            format!("{size} bytes")
        };
    }

    let mut value = size as f64;
    let mut unit = "bytes";
    for next in ["KiB", "MiB", "GiB", "TiB"] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    let number = format!("{value:.2}");
    let number = number.trim_end_matches('0').trim_end_matches('.');
    format!("{number} {unit}")
}

fn format_ratio(percent: f64, better: &str) -> String {
    if percent.is_finite() {
        format!("{percent:.1} % ({better} is better)")
    } else {
        format!("inf % ({better} is better)")
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        f64::INFINITY
    } else {
        100.0 * numerator as f64 / denominator as f64
    }
}

fn average(values: &[usize]) -> Option<usize> {
    if values.is_empty() {
        return None;
    }
    let total: usize = values.iter().sum();
    Some((total as f64 / values.len() as f64).round() as usize)
}

fn median(values: &[usize]) -> Option<usize> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]).div_ceil(2))
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[cfg(feature = "cli")]
impl StreamInfo {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "number_of_diffs": self.number_of_diffs(),
            "diff_size": self.diff_size(),
            "average_diff_size": self.average_diff_size(),
            "median_diff_size": self.median_diff_size(),
            "number_of_extras": self.number_of_extras(),
            "extra_size": self.extra_size(),
            "average_extra_size": self.average_extra_size(),
            "median_extra_size": self.median_extra_size(),
            "control_size": self.control_size,
        })
    }
}

#[cfg(feature = "cli")]
impl PatchInfo {
    /// Machine readable form of the report. Ratios on a zero denominator
    /// are `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let finite = |r: f64| r.is_finite().then_some(r);
        let mut value = serde_json::json!({
            "type": self.patch_type.name(),
            "compression": self.compression.name(),
            "patch_size": self.patch_size,
            "to_size": self.to_size,
            "patch_to_ratio": finite(self.patch_to_ratio()),
            "diff_extra_ratio": finite(self.streams.diff_extra_ratio()),
            "size_data_ratio": finite(self.streams.size_data_ratio()),
            "streams": self.streams.to_json(),
        });
        if let Some(in_place) = &self.in_place {
            let segments: Vec<serde_json::Value> = in_place
                .segments
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "index": s.index,
                        "from": [s.from.start, s.from.end],
                        "to": [s.to.start, s.to.end],
                        "streams": s.streams.to_json(),
                    })
                })
                .collect();
            value["memory_size"] = in_place.memory_size.into();
            value["segment_size"] = in_place.segment_size.into();
            value["shift_size"] = in_place.shift_size.into();
            value["from_size"] = in_place.from_size.into();
            value["segments"] = segments.into();
        }
        value
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
