mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::{bgr, build_bmp, write_file};
use rgb::RGB8;
use segbmp::*;

const RED: Color = bgr(200, 10, 10);
const GREEN: Color = bgr(10, 200, 10);
const BLUE: Color = bgr(10, 10, 200);

fn definitions() -> ColorEntityMap {
    ColorEntityMap::from_definitions([
        (1, RGB8::new(200, 10, 10)),
        (2, RGB8::new(10, 200, 10)),
        (3, RGB8::new(10, 10, 200)),
    ])
    .unwrap()
}

/// 10x3: stride 32, so every row carries two padding bytes.
fn province_rows() -> Vec<Vec<Color>> {
    vec![
        [vec![RED; 3], vec![GREEN; 2], vec![OCEAN_COLOR; 5]].concat(),
        [
            vec![RED],
            vec![BLUE; 3],
            vec![GREEN; 3],
            vec![IMPASSABLE_COLOR],
            vec![OCEAN_COLOR; 2],
        ]
        .concat(),
        vec![BLUE; 10],
    ]
}

#[test]
fn decode_then_encode_reproduces_pixel_data() {
    let dir = tempfile::tempdir().unwrap();
    let original = build_bmp(&province_rows());
    let path = write_file(&dir, "provinces.bmp", &original);

    let map = definitions();
    let mut decoder = BitmapDecoder::open(&path).unwrap();
    assert_eq!(decoder.header().stride(), 32);
    let index = decoder
        .decode_index(&map, "provinces bitmap", Unstoppable)
        .unwrap();

    let encoded = encode_to_vec(&index, &map.inverse(), Unstoppable).unwrap();
    assert_eq!(&encoded[0..2], b"BM");
    assert_eq!(encoded.len(), original.len());
    assert_eq!(&encoded[54..], &original[54..]);
}

#[test]
fn encoder_writes_file_that_decodes_identically() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(&dir, "in.bmp", &build_bmp(&province_rows()));
    let dst = dir.path().join("out.bmp");

    let map = definitions();
    let index = BitmapDecoder::open(&src)
        .unwrap()
        .decode_index(&map, "", Unstoppable)
        .unwrap();

    let mut encoder = BitmapEncoder::create(&dst).unwrap();
    encoder
        .encode(10, 3, &index, &map.inverse(), Unstoppable)
        .unwrap();
    encoder.finish().unwrap();

    let written = std::fs::read(&dst).unwrap();
    let original = std::fs::read(&src).unwrap();
    assert_eq!(&written[54..], &original[54..]);

    let again = BitmapDecoder::open(&dst)
        .unwrap()
        .decode_index(&map, "", Unstoppable)
        .unwrap();
    assert_eq!(again.rows(), index.rows());
}

#[test]
fn runs_cover_each_row_exactly() {
    let map = definitions();
    let bytes = build_bmp(&province_rows());
    let index = BitmapDecoder::from_reader(std::io::Cursor::new(bytes), "memory")
        .unwrap()
        .decode_index(&map, "", Unstoppable)
        .unwrap();

    for row in index.rows() {
        let total: u32 = row.spans().map(|(_, start, end)| end - start).sum();
        assert_eq!(total, 10);
        assert_eq!(row.covered(), 10);
    }

    assert_eq!(
        index.row(0).spans().collect::<Vec<_>>(),
        vec![
            (Entity::Id(1), 0, 3),
            (Entity::Id(2), 3, 5),
            (Entity::Ocean, 5, 10)
        ]
    );
    assert_eq!(
        index.row(1).spans().collect::<Vec<_>>(),
        vec![
            (Entity::Id(1), 0, 1),
            (Entity::Id(3), 1, 4),
            (Entity::Id(2), 4, 7),
            (Entity::Impassable, 7, 8),
            (Entity::Ocean, 8, 10),
        ]
    );
    assert_eq!(index.row(2).runs(), &[Run { entity: Entity::Id(3), end_x: 10 }]);
    assert_eq!(index.run_count(), 9);
}

#[test]
fn encode_size_mismatch_is_rejected() {
    let map = ColorEntityMap::new();
    let bytes = build_bmp(&[vec![OCEAN_COLOR; 2], vec![OCEAN_COLOR; 2]]);
    let index = BitmapDecoder::from_reader(std::io::Cursor::new(bytes), "memory")
        .unwrap()
        .decode_index(&map, "", Unstoppable)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut encoder = BitmapEncoder::create(dir.path().join("out.bmp")).unwrap();
    match encoder.encode(3, 2, &index, &map.inverse(), Unstoppable) {
        Err(BitmapError::DimensionsMismatch {
            width: 3,
            actual_width: 2,
            ..
        }) => {}
        other => panic!("expected DimensionsMismatch, got {other:?}"),
    }
}

#[test]
fn entity_missing_from_inverse_map_is_reported() {
    let map = definitions();
    let bytes = build_bmp(&[vec![RED, OCEAN_COLOR], vec![OCEAN_COLOR; 2]]);
    let index = BitmapDecoder::from_reader(std::io::Cursor::new(bytes), "memory")
        .unwrap()
        .decode_index(&map, "", Unstoppable)
        .unwrap();

    // Sentinels only: entity #1 has no color here.
    let colors = ColorEntityMap::new().inverse();
    match encode_to_vec(&index, &colors, Unstoppable) {
        Err(BitmapError::UnmappedEntity(Entity::Id(1))) => {}
        other => panic!("expected UnmappedEntity, got {other:?}"),
    }
}

#[test]
#[should_panic(expected = "runs cover")]
fn short_row_is_an_invariant_violation() {
    let map = ColorEntityMap::new();
    let mut index = ColorSegmentIndex::new(4, 2, &map);
    index.add_run(OCEAN_COLOR, 0, 4, 1).unwrap();
    index.add_run(OCEAN_COLOR, 0, 3, 0).unwrap();
    let _ = encode_to_vec(&index, &map.inverse(), Unstoppable);
}

#[test]
fn single_column_index_is_not_encoded() {
    let map = ColorEntityMap::new();
    let mut index = ColorSegmentIndex::new(1, 2, &map);
    index.add_run(OCEAN_COLOR, 0, 1, 1).unwrap();
    index.add_run(OCEAN_COLOR, 0, 1, 0).unwrap();

    match encode_to_vec(&index, &map.inverse(), Unstoppable) {
        Err(BitmapError::DimensionsTooSmall { width: 1, height: 2 }) => {}
        other => panic!("expected DimensionsTooSmall, got {other:?}"),
    }

    let dir = tempfile::tempdir().unwrap();
    let mut encoder = BitmapEncoder::create(dir.path().join("thin.bmp")).unwrap();
    assert!(matches!(
        encoder.encode(1, 2, &index, &map.inverse(), Unstoppable),
        Err(BitmapError::DimensionsTooSmall { .. })
    ));
}

#[test]
fn create_in_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    match BitmapEncoder::create(dir.path().join("missing").join("out.bmp")) {
        Err(BitmapError::Io { action, path, .. }) => {
            assert_eq!(action, "opening file for writing");
            assert!(path.ends_with("missing/out.bmp"));
        }
        other => panic!("expected Io, got {other:?}"),
    }
}

/// Lets `allowed` checks pass, then cancels.
struct CancelAfter {
    allowed: usize,
    checks: AtomicUsize,
}

impl CancelAfter {
    fn new(allowed: usize) -> Self {
        Self {
            allowed,
            checks: AtomicUsize::new(0),
        }
    }
}

impl Stop for CancelAfter {
    fn check(&self) -> std::result::Result<(), StopReason> {
        if self.checks.fetch_add(1, Ordering::Relaxed) < self.allowed {
            Ok(())
        } else {
            Err(StopReason::Cancelled)
        }
    }
}

/// 2x40 all-ocean image: stop is checked at file rows 0, 16 and 32.
fn tall_ocean() -> Vec<u8> {
    build_bmp(&vec![vec![OCEAN_COLOR; 2]; 40])
}

#[test]
fn cancelled_decode_stops_between_row_batches() {
    let stop = CancelAfter::new(1);
    let mut decoder =
        BitmapDecoder::from_reader(std::io::Cursor::new(tall_ocean()), "memory").unwrap();

    let mut rows = 0;
    let result = decoder.for_each_run(&stop, |_, _, _, _| {
        rows += 1;
        Ok(())
    });
    assert!(matches!(
        result,
        Err(BitmapError::Cancelled(StopReason::Cancelled))
    ));
    assert_eq!(rows, 16);

    let map = ColorEntityMap::new();
    let result = decoder.decode_index(&map, "", CancelAfter::new(0));
    assert!(matches!(result, Err(BitmapError::Cancelled(_))));
}

#[test]
fn cancelled_encode_returns_cancelled() {
    let map = ColorEntityMap::new();
    let index = BitmapDecoder::from_reader(std::io::Cursor::new(tall_ocean()), "memory")
        .unwrap()
        .decode_index(&map, "", Unstoppable)
        .unwrap();

    let stop = CancelAfter::new(2);
    let err = encode_to_vec(&index, &map.inverse(), &stop).unwrap_err();
    assert!(matches!(err, BitmapError::Cancelled(StopReason::Cancelled)));
    assert_eq!(stop.checks.load(Ordering::Relaxed), 3);
    assert_eq!(err.to_string(), "operation cancelled");
}
