//! detools: bsdiff-style binary delta encoding with in-place patching.
//!
//! The crate provides:
//! - Normal patches, turning one buffer into another (`create`, `apply`)
//! - In-place patches, applied segment by segment inside one fixed memory
//!   region (`inplace`)
//! - Block compression with none, lzma or crle (`compress`)
//! - Patch statistics (`info`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use detools::{CreateOptions, apply_patch_vec, create_patch_vec};
//!
//! let from = b"hello old world";
//! let to = b"hello new world";
//!
//! let patch = create_patch_vec(from, to, &CreateOptions::default()).unwrap();
//! let decoded = apply_patch_vec(from, &patch).unwrap();
//! assert_eq!(decoded, to);
//! ```

pub mod apply;
pub mod compress;
pub mod create;
pub mod diff;
pub mod error;
pub mod format;
pub mod info;
pub mod inplace;
pub mod io;
pub mod patch;

#[cfg(feature = "cli")]
pub mod cli;

pub use apply::{apply_patch, apply_patch_in_place, apply_patch_vec};
pub use compress::Compression;
pub use create::{CreateOptions, create_patch, create_patch_vec};
pub use error::{Error, Result};
pub use format::PatchType;
pub use info::{PatchInfo, patch_info, read_patch_info};
