#![no_main]
use detools::apply::{apply_patch_in_place, apply_patch_vec};
use detools::{Compression, CreateOptions, create_patch_vec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    // First byte selects compression and patch type, second the split.
    let flags = data[0];
    let compression = match flags % 3 {
        0 => Compression::None,
        1 => Compression::Lzma,
        _ => Compression::Crle,
    };
    let split = 2 + (data[1] as usize % (data.len() - 2));
    let from = &data[2..split];
    let to = &data[split..];

    if flags & 0x80 == 0 {
        let opts = CreateOptions::default().with_compression(compression);
        let patch = create_patch_vec(from, to, &opts).unwrap();
        let decoded = apply_patch_vec(from, &patch).unwrap();
        assert_eq!(decoded, to);
    } else {
        let memory_size = from.len().max(to.len()).max(1);
        let segment_size = (usize::from(flags & 0x3F) + 1).min(memory_size);
        let opts = CreateOptions::in_place(memory_size, segment_size).with_compression(compression);
        let patch = create_patch_vec(from, to, &opts).unwrap();
        let mut memory = from.to_vec();
        apply_patch_in_place(&mut memory, &patch).unwrap();
        assert_eq!(memory, to);
    }
});
