// File-level helpers around the in-memory core.
//
// Inputs are read fully into memory; outputs go through a `BufWriter`.
// With the `file-io` feature the SHA-256 of the produced data is computed
// while it is written.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::apply::{apply_patch, apply_patch_in_place};
use crate::create::{CreateOptions, create_patch};
use crate::error::Result;
use crate::info::{PatchInfo, read_patch_info};

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `create_patch_file()`.
#[derive(Debug, Clone)]
pub struct CreateStats {
    pub from_size: u64,
    pub to_size: u64,
    pub patch_size: u64,
    /// SHA-256 of the patch (if `file-io` feature is enabled).
    pub patch_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `apply_patch_file()` and
/// `apply_patch_in_place_file()`.
#[derive(Debug, Clone)]
pub struct ApplyStats {
    pub from_size: u64,
    pub patch_size: u64,
    pub to_size: u64,
    /// SHA-256 of the written to data (if `file-io` feature is enabled).
    pub to_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// create / apply
// ---------------------------------------------------------------------------

/// Create a patch from two files.
pub fn create_patch_file(
    from_path: &Path,
    to_path: &Path,
    patch_path: &Path,
    opts: &CreateOptions,
) -> Result<CreateStats> {
    let from = fs::read(from_path)?;
    let to = fs::read(to_path)?;

    let mut patch = Vec::new();
    create_patch(&from, &to, &mut patch, opts)?;
    let patch_sha256 = write_output(patch_path, &patch)?;

    Ok(CreateStats {
        from_size: from.len() as u64,
        to_size: to.len() as u64,
        patch_size: patch.len() as u64,
        patch_sha256,
    })
}

/// Apply a normal patch file to a from file, writing the to file.
pub fn apply_patch_file(from_path: &Path, patch_path: &Path, to_path: &Path) -> Result<ApplyStats> {
    let from = fs::read(from_path)?;
    let patch = fs::read(patch_path)?;

    // Build in memory so a failing patch leaves no partial to file.
    let mut to = Vec::new();
    apply_patch(&from, &patch, &mut to)?;
    let to_sha256 = write_output(to_path, &to)?;

    Ok(ApplyStats {
        from_size: from.len() as u64,
        patch_size: patch.len() as u64,
        to_size: to.len() as u64,
        to_sha256,
    })
}

/// Apply an in-place patch. The memory file holds the from data and is
/// rewritten with the to data.
pub fn apply_patch_in_place_file(memory_path: &Path, patch_path: &Path) -> Result<ApplyStats> {
    let mut memory = fs::read(memory_path)?;
    let from_size = memory.len() as u64;
    let patch = fs::read(patch_path)?;

    apply_patch_in_place(&mut memory, &patch)?;
    let to_sha256 = write_output(memory_path, &memory)?;

    Ok(ApplyStats {
        from_size,
        patch_size: patch.len() as u64,
        to_size: memory.len() as u64,
        to_sha256,
    })
}

/// Read a patch file and collect its statistics.
pub fn patch_info_file(patch_path: &Path) -> Result<PatchInfo> {
    read_patch_info(&fs::read(patch_path)?)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn write_output(path: &Path, data: &[u8]) -> io::Result<Option<[u8; 32]>> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);

    #[cfg(feature = "file-io")]
    let digest = {
        let mut hasher = sha2::Sha256::new();
        let mut hashing_writer = HashingWriter {
            inner: &mut writer,
            hasher: &mut hasher,
        };
        hashing_writer.write_all(data)?;
        Some(hasher.finalize().into())
    };

    #[cfg(not(feature = "file-io"))]
    let digest = {
        writer.write_all(data)?;
        None
    };

    writer.flush()?;
    Ok(digest)
}

// ---------------------------------------------------------------------------
// Hashing writer (used with file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
