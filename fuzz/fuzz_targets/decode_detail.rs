#![no_main]

use archscope::{decode_detail, Arch};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = decode_detail(data, Arch::X86);
    let _ = decode_detail(data, Arch::Arm);
    let _ = decode_detail(data, Arch::Aarch64);
});
