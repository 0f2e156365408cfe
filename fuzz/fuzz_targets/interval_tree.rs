#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Inputs that don't decode to a valid case are skipped.
    let _ = textflow::arbitrary::arbtests::interval_tree(&mut Unstructured::new(data));
});
