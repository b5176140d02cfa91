#![no_main]
use detools::info::{format_patch_info, read_patch_info};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(info) = read_patch_info(data) {
        assert_eq!(info.patch_size, data.len());
        let _ = format_patch_info(&info, true);
        let _ = format_patch_info(&info, false);
        let _ = info.to_json();
    }
});
