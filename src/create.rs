// Patch creation: diff the inputs and write the container.

use std::io::Write;

use log::{debug, info};

use crate::compress::Compression;
use crate::diff::diff;
use crate::error::{Error, Result};
use crate::format::{Header, PatchType, varint};
use crate::inplace::InPlacePlan;
use crate::patch::StreamEncoder;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for `create_patch()`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub patch_type: PatchType,
    pub compression: Compression,
    /// In-place only: size of the memory region the patch is applied in.
    pub memory_size: Option<usize>,
    /// In-place only: number of bytes written per segment.
    pub segment_size: Option<usize>,
    /// In-place only: lower bound for the shift of the old data.
    /// Defaults to two segments.
    pub minimum_shift_size: Option<usize>,
}

impl CreateOptions {
    /// Options for an in-place patch.
    pub fn in_place(memory_size: usize, segment_size: usize) -> Self {
        Self {
            patch_type: PatchType::InPlace,
            memory_size: Some(memory_size),
            segment_size: Some(segment_size),
            ..Self::default()
        }
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_minimum_shift_size(mut self, minimum_shift_size: usize) -> Self {
        self.minimum_shift_size = Some(minimum_shift_size);
        self
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Create a patch turning `from` into `to` and write it to `patch`.
///
/// Returns the number of patch bytes written.
pub fn create_patch<W: Write>(
    from: &[u8],
    to: &[u8],
    patch: &mut W,
    opts: &CreateOptions,
) -> Result<usize> {
    let header = Header {
        patch_type: opts.patch_type,
        compression: opts.compression,
    };
    let mut body = Vec::new();
    header.encode(&mut body)?;

    match opts.patch_type {
        PatchType::Normal => write_normal(from, to, &mut body, opts.compression)?,
        PatchType::InPlace => {
            let memory_size = opts.memory_size.ok_or_else(|| {
                Error::Config("In-place patches need a memory size.".into())
            })?;
            let segment_size = opts.segment_size.ok_or_else(|| {
                Error::Config("In-place patches need a segment size.".into())
            })?;
            let plan = InPlacePlan::new(
                from.len(),
                to.len(),
                memory_size,
                segment_size,
                opts.minimum_shift_size,
            )?;
            write_in_place(from, to, &plan, &mut body, opts.compression)?;
        }
    }

    patch.write_all(&body)?;
    let written = body.len();
    info!(
        "created {} patch of {written} bytes ({} -> {} bytes, {})",
        opts.patch_type,
        from.len(),
        to.len(),
        opts.compression
    );
    Ok(written)
}

/// Convenience: create a patch into a new buffer.
pub fn create_patch_vec(from: &[u8], to: &[u8], opts: &CreateOptions) -> Result<Vec<u8>> {
    let mut patch = Vec::new();
    create_patch(from, to, &mut patch, opts)?;
    Ok(patch)
}

fn write_normal<W: Write>(from: &[u8], to: &[u8], w: &mut W, compression: Compression) -> Result<()> {
    varint::write_usize(w, to.len())?;
    if to.is_empty() {
        return Ok(());
    }
    let mut encoder = StreamEncoder::new();
    encoder.extend(diff(from, to)?);
    encoder.finish(compression, w)?;
    Ok(())
}

fn write_in_place<W: Write>(
    from: &[u8],
    to: &[u8],
    plan: &InPlacePlan,
    w: &mut W,
    compression: Compression,
) -> Result<()> {
    plan.header().encode(w)?;
    let from = &from[..plan.from_size];
    for segment in plan.segments() {
        let window = &from[segment.from_data_range(plan.shift_size)];
        let mut encoder = StreamEncoder::new();
        encoder.extend(diff(window, &to[segment.to.clone()])?);
        debug!(
            "segment {}: to {:?}, from window of {} bytes, {} instructions",
            segment.index,
            segment.to,
            window.len(),
            encoder.instructions()
        );
        encoder.finish(compression, w)?;
    }
    Ok(())
}
