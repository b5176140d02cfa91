use detools::io::{apply_patch_file, apply_patch_in_place_file, create_patch_file};
use detools::{Compression, CreateOptions, apply_patch_vec, create_patch_vec};
use tempfile::NamedTempFile;

fn firmware_like(size: usize, seed: u64) -> Vec<u8> {
    // Repeating records with a counter, similar to a code image.
    let mut state = seed;
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        data.extend_from_slice(b"\x10\xb5\x04\x46");
        data.extend_from_slice(&((state >> 40) as u32).to_le_bytes());
    }
    data.truncate(size);
    data
}

#[test]
#[ignore = "multi-MB test is opt-in due runtime"]
fn multi_mb_file_roundtrip() {
    let from = NamedTempFile::new().unwrap();
    let to = NamedTempFile::new().unwrap();
    let patch = NamedTempFile::new().unwrap();
    let output = NamedTempFile::new().unwrap();

    let from_data = firmware_like(16 * 1024 * 1024, 1);
    let mut to_data = from_data.clone();
    to_data[64 * 1024..64 * 1024 + 14].copy_from_slice(b"mutated-block!");
    to_data.splice(8 * 1024 * 1024..8 * 1024 * 1024, b"middle-chunk".iter().copied());
    std::fs::write(from.path(), &from_data).unwrap();
    std::fs::write(to.path(), &to_data).unwrap();

    let create = create_patch_file(
        from.path(),
        to.path(),
        patch.path(),
        &CreateOptions::default(),
    )
    .unwrap();
    assert!(create.patch_size > 0);
    assert!(create.patch_size < to_data.len() as u64 / 10);

    let apply = apply_patch_file(from.path(), patch.path(), output.path()).unwrap();
    assert_eq!(apply.to_size, to_data.len() as u64);
    assert_eq!(std::fs::read(output.path()).unwrap(), to_data);
}

#[test]
#[ignore = "multi-MB test is opt-in due runtime"]
fn multi_mb_in_place_roundtrip() {
    let memory = NamedTempFile::new().unwrap();
    let to = NamedTempFile::new().unwrap();
    let patch = NamedTempFile::new().unwrap();

    let from_data = firmware_like(4 * 1024 * 1024, 2);
    let mut to_data = from_data.clone();
    to_data.splice(1024..1024, firmware_like(4096, 3));
    std::fs::write(memory.path(), &from_data).unwrap();
    std::fs::write(to.path(), &to_data).unwrap();

    let opts = CreateOptions::in_place(6 * 1024 * 1024, 64 * 1024).with_compression(Compression::Crle);
    create_patch_file(memory.path(), to.path(), patch.path(), &opts).unwrap();
    apply_patch_in_place_file(memory.path(), patch.path()).unwrap();
    assert_eq!(std::fs::read(memory.path()).unwrap(), to_data);
}

#[test]
fn edge_case_matrix() {
    let cases: Vec<(&[u8], &[u8])> = vec![
        (b"", b""),
        (b"", b"x"),
        (b"x", b""),
        (b"\0\0\0\0\0", b"\0\0\0\0\0"),
        (b"\0\0\0\0\0", b"\0\0\0\0\x01"),
    ];

    for (from, to) in cases {
        for compression in [Compression::None, Compression::Lzma, Compression::Crle] {
            let opts = CreateOptions::default().with_compression(compression);
            let patch = create_patch_vec(from, to, &opts).unwrap();
            assert_eq!(apply_patch_vec(from, &patch).unwrap(), to);
        }
    }
}
