// Patch container body: instructions and the streams that carry them.
//
// - `instruction`: the (diff, extra, adjustment) step
// - `writer`: `StreamEncoder`, instructions to compressed blocks
// - `reader`: `PatchReader` and `InstructionReader`, blocks back to instructions

pub mod instruction;
pub mod reader;
pub mod writer;

pub use instruction::Instruction;
pub use reader::{BlockSizes, InstructionReader, PatchReader, Streams};
pub use writer::StreamEncoder;
