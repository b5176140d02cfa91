// Patch container format.
//
// - `varint`: signed variable-length size encoding
// - `header`: patch type / compression header and in-place layout fields

pub mod header;
pub mod varint;

pub use header::{Header, InPlaceHeader, PatchType};
