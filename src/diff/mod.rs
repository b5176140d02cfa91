// Differ: old/new byte buffers to a lazy instruction stream.
//
// - `search`: suffix array match search producing raw controls
//
// `diff()` wraps the search, materializes the diff bytes of each control and
// folds cursor-only steps into the preceding instruction.

pub mod search;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::patch::Instruction;

use search::{Control, Search};

/// Largest old data the suffix array can index.
pub use suffix_array::MAX_LENGTH;

/// Compute the instructions turning `from` into `to`.
///
/// Fails only when `from` is too large to be indexed.
pub fn diff<'a>(from: &'a [u8], to: &'a [u8]) -> Result<Instructions<'a>> {
    if from.len() > MAX_LENGTH {
        return Err(Error::Config(format!(
            "From data of {} bytes is too large to be indexed.",
            from.len()
        )));
    }

    let state = if to.is_empty() {
        State::Single(Some(Instruction::default()))
    } else if from.is_empty() {
        State::Single(Some(Instruction {
            extra: to.into(),
            ..Instruction::default()
        }))
    } else {
        debug!("indexing {} bytes of from data", from.len());
        State::Search(Box::new(Search::new(from, to)))
    };

    Ok(Instructions {
        from,
        to,
        state,
        from_pos: 0,
        to_pos: 0,
        pending: None,
    })
}

enum State<'a> {
    Single(Option<Instruction<'a>>),
    Search(Box<Search<'a>>),
}

/// Lazy, single-pass instruction stream returned by [`diff`].
pub struct Instructions<'a> {
    from: &'a [u8],
    to: &'a [u8],
    state: State<'a>,
    from_pos: usize,
    to_pos: usize,
    pending: Option<Instruction<'a>>,
}

impl<'a> Instructions<'a> {
    fn materialize(&mut self, control: Control) -> Instruction<'a> {
        let Control { diff, extra, seek } = control;
        let old = &self.from[self.from_pos..self.from_pos + diff];
        let new = &self.to[self.to_pos..self.to_pos + diff];
        let diff_bytes: Vec<u8> = old.iter().zip(new).map(|(o, n)| n.wrapping_sub(*o)).collect();
        self.to_pos += diff;
        let extra_bytes = &self.to[self.to_pos..self.to_pos + extra];
        self.to_pos += extra;
        self.from_pos = (self.from_pos + diff).wrapping_add(seek as usize);
        Instruction::new(diff_bytes, extra_bytes, seek)
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Instruction<'a>;

    fn next(&mut self) -> Option<Instruction<'a>> {
        loop {
            let control = match &mut self.state {
                State::Single(single) => return single.take(),
                State::Search(search) => search.next(),
            };
            let Some(control) = control else {
                return self.pending.take();
            };

            if control.diff == 0 && control.extra == 0 {
                self.from_pos = self.from_pos.wrapping_add(control.seek as usize);
                match &mut self.pending {
                    Some(previous) => previous.adjustment += control.seek,
                    None if control.seek != 0 => {
                        self.pending = Some(Instruction::seek(control.seek));
                    }
                    None => {}
                }
                continue;
            }

            let instruction = self.materialize(control);
            trace!(
                "instruction diff={} extra={} adjustment={}",
                instruction.diff_size(),
                instruction.extra_size(),
                instruction.adjustment
            );
            if let Some(previous) = self.pending.replace(instruction) {
                return Some(previous);
            }
        }
    }
}
