#![no_main]
use detools::apply::{apply_patch_in_place, apply_patch_vec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Applying arbitrary bytes must only ever return errors.
    let _ = apply_patch_vec(&[], data);

    if data.len() >= 2 {
        let split = data.len() / 2;
        let (from, patch) = data.split_at(split);
        let _ = apply_patch_vec(from, patch);

        let mut memory = from.to_vec();
        let _ = apply_patch_in_place(&mut memory, patch);
    }
});
