#![no_main]

//! Fuzz the page-boundary text decoder on arbitrary input.
//!
//! Any byte sequence may arrive over the page boundary; decoding must
//! reject malformed input with an error, never panic. Successfully decoded
//! envelopes must re-encode to a value that decodes identically.

use libfuzzer_sys::fuzz_target;
use relay_proto::{decode_page, decode_page_text, encode_page};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(envelope) = decode_page_text(text) {
        let reencoded = encode_page(envelope.correlation, &envelope.name, &envelope.args);
        let again = decode_page(&reencoded).expect("re-encoded envelope must decode");
        assert_eq!(again.correlation, envelope.correlation);
        assert_eq!(again.name, envelope.name);
        assert_eq!(again.args, envelope.args);
    }
});
