#![no_main]

use libfuzzer_sys::fuzz_target;
use mlayer_core::position::{PositionSpec, compute};

fuzz_target!(|data: &[u8]| {
    let Ok(spec) = std::str::from_utf8(data) else {
        return;
    };
    let _ = PositionSpec::parse(spec);
    let style = compute(spec, 800.0, 300.0);
    for (_, value) in style.declarations() {
        assert!(value.ends_with("px") || value == "left" || value == "right");
    }
});
