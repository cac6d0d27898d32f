#![no_main]

//! Fuzz the native-runtime and legacy-event decoders on arbitrary JSON.

use libfuzzer_sys::fuzz_target;
use relay_proto::{decode_event_payload, decode_event_response, decode_runtime};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    let _ = decode_runtime(&value);
    let _ = decode_event_payload(&value);
    let _ = decode_event_response(&value);
});
