// Patch application: replay instructions against old data.

use std::io::{self, Write};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::format::header::{PATCH_TYPE_IN_PLACE, PATCH_TYPE_NORMAL};
use crate::inplace::InPlacePlan;
use crate::patch::{BlockSizes, InstructionReader, PatchReader, Streams};

/// Apply a normal patch to `from`, writing the new data to `to`.
///
/// Returns the size of the new data.
pub fn apply_patch<W: Write>(from: &[u8], patch: &[u8], to: &mut W) -> Result<usize> {
    let mut reader = PatchReader::new(patch);
    let header = reader.read_header_of(PATCH_TYPE_NORMAL)?;
    let to_size = reader.read_usize()?;

    if to_size > 0 {
        let streams = reader.read_streams(header.compression)?;
        reader.finish()?;
        let mut instructions = InstructionReader::new(&streams, to_size);
        replay(from, &mut instructions, to)?;
        instructions.finish()?;
    } else {
        reader.finish()?;
    }

    info!("applied normal patch: {} -> {to_size} bytes", from.len());
    Ok(to_size)
}

/// Convenience: apply a normal patch into a new buffer.
pub fn apply_patch_vec(from: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    let mut to = Vec::new();
    apply_patch(from, patch, &mut to)?;
    Ok(to)
}

/// Apply an in-place patch.
///
/// `memory` holds the old data on entry and the new data on success. It
/// grows to the part of the patch's memory region the plan touches while
/// the patch is applied. The container is checked for completeness before
/// `memory` is touched; a failure while replaying leaves it partially
/// rewritten.
pub fn apply_patch_in_place(memory: &mut Vec<u8>, patch: &[u8]) -> Result<usize> {
    let mut reader = PatchReader::new(patch);
    let header = reader.read_header_of(PATCH_TYPE_IN_PLACE)?;
    let plan = InPlacePlan::from_header(
        &reader.read_in_place_header()?,
        reader.remaining_len(),
    )?;

    if memory.len() < plan.from_size {
        return Err(Error::FromDataOutOfRange);
    }

    let mut blocks: Vec<[(BlockSizes, &[u8]); 3]> = Vec::with_capacity(plan.number_of_segments());
    for _ in 0..plan.number_of_segments() {
        blocks.push([
            reader.read_raw_block()?,
            reader.read_raw_block()?,
            reader.read_raw_block()?,
        ]);
    }
    reader.finish()?;

    let needed = plan.to_size.max(plan.shift_size + plan.from_size);
    memory
        .try_reserve(needed.saturating_sub(memory.len()))
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    if memory.len() < needed {
        memory.resize(needed, 0);
    }
    memory.copy_within(0..plan.from_size, plan.shift_size);

    let compression = header.compression;
    for (segment, [control, diff, extra]) in plan.segments().zip(blocks) {
        let streams = Streams {
            control: compression.decompress(control.1, control.0.uncompressed)?,
            diff: compression.decompress(diff.1, diff.0.uncompressed)?,
            extra: compression.decompress(extra.1, extra.0.uncompressed)?,
        };
        debug!(
            "segment {}: to {:?}, from {:?}",
            segment.index, segment.to, segment.from
        );

        // Everything below the read window is writable; the window itself
        // stays untouched. An empty window may start below `to.end`.
        let split = segment.from.start.max(segment.to.end);
        let (head, tail) = memory.split_at_mut(split);
        let from = &tail[..segment.from.len()];
        let mut sink: &mut [u8] = &mut head[segment.to.clone()];
        let mut instructions = InstructionReader::new(&streams, segment.to.len());
        replay(from, &mut instructions, &mut sink)?;
        instructions.finish()?;
    }

    memory.truncate(plan.to_size);
    info!(
        "applied in-place patch: {} segments, {} bytes",
        plan.number_of_segments(),
        plan.to_size
    );
    Ok(plan.to_size)
}

/// Replay every instruction of `instructions` against `from` into `to`.
///
/// The cursor starts at the beginning of `from` and may leave it between
/// instructions; it is only checked where diff bytes are read.
pub fn replay<W: Write>(
    from: &[u8],
    instructions: &mut InstructionReader<'_>,
    to: &mut W,
) -> Result<()> {
    let mut cursor: i64 = 0;
    let mut buf = Vec::new();

    while let Some(instruction) = instructions.next_instruction()? {
        let diff_size = instruction.diff_size();
        if diff_size > 0 {
            let old = usize::try_from(cursor)
                .ok()
                .and_then(|start| from.get(start..start.checked_add(diff_size)?))
                .ok_or(Error::FromDataOutOfRange)?;
            buf.clear();
            buf.extend(
                old.iter()
                    .zip(instruction.diff.iter())
                    .map(|(o, d)| o.wrapping_add(*d)),
            );
            to.write_all(&buf)?;
        }
        to.write_all(&instruction.extra)?;

        cursor = i64::try_from(diff_size)
            .ok()
            .and_then(|n| cursor.checked_add(n)?.checked_add(instruction.adjustment))
            .ok_or(Error::FromDataOutOfRange)?;
    }

    Ok(())
}
