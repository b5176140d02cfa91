// Stream compression for patch blocks.
//
// - `backend`: Compression selector and the per-algorithm codecs
// - `crle`: the run-length format used by the `crle` compression

pub mod backend;
pub mod crle;

pub use backend::{CompressBackend, Compression, CrleBackend, LzmaBackend, NoCompression};
