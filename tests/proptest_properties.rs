use detools::apply::apply_patch_in_place;
use detools::compress::crle;
use detools::format::varint;
use detools::info::read_patch_info;
use detools::{Compression, CreateOptions, apply_patch_vec, create_patch_vec};
use proptest::prelude::*;

fn compression() -> impl Strategy<Value = Compression> {
    prop_oneof![
        Just(Compression::None),
        Just(Compression::Lzma),
        Just(Compression::Crle),
    ]
}

/// In-place header values: mostly small, sometimes anywhere up to `i64::MAX`.
fn header_field() -> impl Strategy<Value = usize> {
    prop_oneof![0usize..64, 0usize..=i64::MAX as usize]
}

proptest! {
    #[test]
    fn prop_normal_roundtrip(
        from in proptest::collection::vec(any::<u8>(), 0..2048),
        to in proptest::collection::vec(any::<u8>(), 0..2048),
        compression in compression()
    ) {
        let opts = CreateOptions::default().with_compression(compression);
        let patch = create_patch_vec(&from, &to, &opts).unwrap();
        prop_assert_eq!(apply_patch_vec(&from, &patch).unwrap(), to);
    }

    #[test]
    fn prop_in_place_roundtrip(
        from in proptest::collection::vec(any::<u8>(), 0..512),
        to in proptest::collection::vec(any::<u8>(), 0..512),
        spare in 0usize..512,
        segment_seed in any::<usize>(),
        shift_seed in proptest::option::of(any::<usize>()),
        compression in compression()
    ) {
        let memory_size = from.len().max(to.len()).max(1) + spare;
        let segment_size = 1 + segment_seed % memory_size;
        let opts = CreateOptions {
            minimum_shift_size: shift_seed.map(|seed| seed % (memory_size + 1)),
            ..CreateOptions::in_place(memory_size, segment_size).with_compression(compression)
        };
        let patch = create_patch_vec(&from, &to, &opts).unwrap();
        let mut memory = from.clone();
        apply_patch_in_place(&mut memory, &patch).unwrap();
        prop_assert_eq!(memory, to);
    }

    #[test]
    fn prop_similar_data_roundtrip(
        from in proptest::collection::vec(any::<u8>(), 256..4096),
        edits in proptest::collection::vec((any::<usize>(), any::<u8>()), 0..16)
    ) {
        let mut to = from.clone();
        for (pos, byte) in edits {
            let len = to.len();
            to[pos % len] = byte;
        }
        let patch = create_patch_vec(&from, &to, &CreateOptions::default()).unwrap();
        prop_assert_eq!(apply_patch_vec(&from, &patch).unwrap(), to);
    }

    #[test]
    fn prop_info_accounts_for_every_byte(
        from in proptest::collection::vec(any::<u8>(), 0..2048),
        to in proptest::collection::vec(any::<u8>(), 0..2048)
    ) {
        let patch = create_patch_vec(&from, &to, &CreateOptions::default()).unwrap();
        let info = read_patch_info(&patch).unwrap();
        prop_assert_eq!(info.to_size, to.len());
        prop_assert_eq!(info.streams.diff_size() + info.streams.extra_size(), to.len());
    }

    #[test]
    fn prop_apply_never_panics(
        from in proptest::collection::vec(any::<u8>(), 0..256),
        patch in proptest::collection::vec(any::<u8>(), 0..256)
    ) {
        let _ = apply_patch_vec(&from, &patch);
        let mut memory = from.clone();
        let _ = apply_patch_in_place(&mut memory, &patch);
        let _ = read_patch_info(&patch);
    }

    #[test]
    fn prop_in_place_header_never_panics(
        compression in 0u8..3,
        fields in proptest::collection::vec(header_field(), 5),
        tail in proptest::collection::vec(any::<u8>(), 0..128)
    ) {
        let mut patch = vec![1, compression];
        for field in fields {
            varint::write_usize(&mut patch, field).unwrap();
        }
        patch.extend(tail);
        let mut memory = vec![0u8; 64];
        let _ = apply_patch_in_place(&mut memory, &patch);
        let _ = read_patch_info(&patch);
    }

    #[test]
    fn prop_size_roundtrip(value in any::<i64>()) {
        let mut buf = [0u8; varint::MAX_SIZE_LEN];
        let len = varint::encode_size(value, &mut buf);
        prop_assert_eq!(varint::read_size(&buf[..len]).unwrap(), (value, len));
    }

    #[test]
    fn prop_crle_roundtrip(data in proptest::collection::vec(prop_oneof![Just(0u8), any::<u8>()], 0..4096)) {
        let compressed = crle::compress(&data);
        prop_assert_eq!(crle::decompress(&compressed, data.len()).unwrap(), data);
    }
}

#[test]
#[ignore = "performance properties are workload and machine dependent"]
fn perf_property_apply_not_pathological() {
    use std::time::Instant;
    let make = |n: usize| -> Vec<u8> { (0..n).map(|i| (i % 251) as u8).collect() };
    let from = make(4 * 1024 * 1024);
    let mut to = from.clone();
    for i in (0..to.len()).step_by(4096) {
        to[i] = to[i].wrapping_add(3);
    }

    let patch = create_patch_vec(&from, &to, &CreateOptions::default()).unwrap();
    let t0 = Instant::now();
    let decoded = apply_patch_vec(&from, &patch).unwrap();
    let dt = t0.elapsed();
    assert_eq!(decoded, to);
    assert!(dt.as_secs_f64() < 20.0, "apply took {:?}", dt);
}
