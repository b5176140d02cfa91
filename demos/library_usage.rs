use detools::apply::apply_patch_in_place;
use detools::{Compression, CreateOptions, apply_patch_vec, create_patch_vec, patch_info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let from = b"ABCD-ABCD-ABCD-ABCD".repeat(16);
    let mut to = from.clone();
    to[5..9].copy_from_slice(b"XXXX");
    to.extend_from_slice(b"-YYYY");

    let patch = create_patch_vec(&from, &to, &CreateOptions::default())?;
    assert_eq!(apply_patch_vec(&from, &patch)?, to);
    print!("{}", patch_info(&patch, true)?);

    let opts = CreateOptions::in_place(512, 64).with_compression(Compression::Crle);
    let patch = create_patch_vec(&from, &to, &opts)?;
    let mut memory = from.clone();
    apply_patch_in_place(&mut memory, &patch)?;
    assert_eq!(memory, to);
    println!("in-place patch of {} bytes applied", patch.len());
    Ok(())
}
