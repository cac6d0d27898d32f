#![no_main]

//! Fuzz header normalization on arbitrary JSON shapes.
//!
//! Raw header arrays come straight from the host network layer and take
//! whatever shape the host produces; normalization must either yield a
//! header set no larger than the input or decline, never panic.

use libfuzzer_sys::fuzz_target;
use relay_core::intercept::normalize;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    if let Some(headers) = normalize(&value) {
        let input_len = value.as_array().map_or(0, Vec::len);
        assert!(headers.len() <= input_len);
        for (name, _) in headers.iter() {
            assert_eq!(name, name.to_ascii_lowercase());
        }
    }
});
