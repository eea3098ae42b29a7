#![no_main]
use std::collections::HashSet;
use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use rgb::RGB8;
use segbmp::*;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 20),
        ..Default::default()
    };
    let Ok(mut decoder) =
        BitmapDecoder::from_reader_with_limits(Cursor::new(data), "fuzz", &limits)
    else {
        return;
    };

    // Map every color present so the index always resolves
    let mut colors = HashSet::new();
    if decoder
        .for_each_run(Unstoppable, |c, _, _, _| {
            colors.insert(c);
            Ok(())
        })
        .is_err()
    {
        return;
    }
    let mut map = ColorEntityMap::new();
    for (id, c) in colors.into_iter().enumerate() {
        if c != IMPASSABLE_COLOR && c != OCEAN_COLOR {
            map.insert(id as u32, RGB8::new(c.r, c.g, c.b)).unwrap();
        }
    }

    let index = decoder.decode_index(&map, "fuzz", Unstoppable).unwrap();
    let encoded = encode_to_vec(&index, &map.inverse(), Unstoppable).unwrap();

    // Re-encoding and decoding again must produce identical runs
    let again = BitmapDecoder::from_reader(Cursor::new(&encoded[..]), "re-encoded")
        .unwrap()
        .decode_index(&map, "fuzz", Unstoppable)
        .unwrap();
    assert_eq!(index.rows(), again.rows(), "roundtrip run mismatch");
});
