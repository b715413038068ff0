#![no_main]

use libfuzzer_sys::fuzz_target;

// Decoding and validation must reject bad input with an error, never a
// panic. Anything that decodes must survive an encode/decode round trip.
fuzz_target!(|data: &[u8]| {
    let Ok(module) = tern::decode(data) else {
        return;
    };
    let valid = tern::validate(&module).is_ok();

    let bytes = tern::encoder::encode(&module);
    let again = tern::decode(&bytes).expect("encoded module should decode");
    assert_eq!(tern::validate(&again).is_ok(), valid);
    assert_eq!(tern::encoder::encode(&again), bytes);
});
