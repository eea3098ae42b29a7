#![no_main]
use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use segbmp::{BitmapDecoder, ColorEntityMap, Limits, Unstoppable};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        ..Default::default()
    };
    let map = ColorEntityMap::new();

    // Header validation, streaming, and stray-color detection must never panic
    let Ok(mut decoder) =
        BitmapDecoder::from_reader_with_limits(Cursor::new(data), "fuzz", &limits)
    else {
        return;
    };
    let _ = decoder.for_each_row(Unstoppable, |_, _| Ok(()));
    let _ = decoder.decode_index(&map, "fuzz input", Unstoppable);
});
