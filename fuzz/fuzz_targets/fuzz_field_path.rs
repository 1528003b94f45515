#![no_main]

use graphlens_core::FieldPath;
use libfuzzer_sys::fuzz_target;

// Parsing must never panic, and a successfully parsed path must survive a
// display round trip.
fuzz_target!(|input: &str| {
    if let Ok(path) = FieldPath::parse(input) {
        let rendered = path.to_string();
        let reparsed = FieldPath::parse(&rendered).expect("rendered path reparses");
        assert_eq!(path, reparsed);
        assert_eq!(path.depth(), path.segments().len());
    }
});
