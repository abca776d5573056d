//! Integration tests for the EVT3 decoder.
//!
//! Synthetic streams run everywhere. The real-recording tests need
//! `test_data/laser.raw` and skip themselves when it is missing.
//! Run with: cargo test --test integration_tests

use evt3_core::{
    decode, decode_from_path, decode_with_triggers, output, DecodeError, DecoderConfig,
    Evt3Decoder, FieldOrder,
};
use std::io::Write;
use std::path::Path;

const TEST_FILE: &str = "test_data/laser.raw";

fn to_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// The synthetic stream used throughout: two ADDR_X events and one VECT_12.
fn synthetic_stream() -> Vec<u8> {
    to_bytes(&[
        0x8000, // TIME_HIGH: 0
        0x6064, // TIME_LOW: 100
        0x00C8, // ADDR_Y: 200
        0x292C, // ADDR_X: pol=1, x=300
        0x6096, // TIME_LOW: 150
        0x2190, // ADDR_X: pol=0, x=400
        0x39F4, // VECT_BASE_X: pol=1, x=500
        0x4038, // VECT_12: 0b000000111000
    ])
}

fn assert_sorted(timestamps: &[u64]) {
    for (i, pair) in timestamps.windows(2).enumerate() {
        assert!(
            pair[0] <= pair[1],
            "Timestamp decreased at event {}: {} -> {}",
            i + 1,
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_single_addr_x_event() {
    let bytes = to_bytes(&[0x8000, 0x6064, 0x00C8, 0x292C]);
    let events = decode(&bytes, 1280, 720).unwrap();

    assert_eq!(events.len(), 1);
    let event = events.get(0).unwrap();
    assert_eq!((event.x, event.y, event.polarity, event.timestamp), (300, 200, 1, 100));
}

#[test]
fn test_synthetic_stream() {
    let events = decode(&synthetic_stream(), 1280, 720).unwrap();

    assert_eq!(events.x(), &[300, 400, 503, 504, 505]);
    assert_eq!(events.y(), &[200; 5]);
    assert_eq!(events.polarity(), &[1, 0, 1, 1, 1]);
    assert_eq!(events.timestamp(), &[100, 150, 150, 150, 150]);
}

#[test]
fn test_consecutive_time_low() {
    let bytes = to_bytes(&[0x6064, 0x0001, 0x2001, 0x2002, 0x6096, 0x2003]);
    let events = decode(&bytes, 1280, 720).unwrap();

    assert_eq!(events.timestamp(), &[100, 100, 150]);
    assert_eq!(events.timestamp()[2] - events.timestamp()[1], 50);
}

#[test]
fn test_columns_have_equal_length() {
    let events = decode(&synthetic_stream(), 1280, 720).unwrap();
    let n = events.len();
    for (name, column) in events.columns() {
        assert_eq!(column.len(), n, "column {} has wrong length", name);
    }
    assert_eq!(events.p().len(), n);
    assert_eq!(events.t().len(), n);
}

#[test]
fn test_empty_buffer() {
    let (events, triggers) = decode_with_triggers(&[], 1280, 720).unwrap();
    assert!(events.is_empty());
    assert!(triggers.is_empty());
    assert_eq!(events.to_string(), "Events(count=0, sensor=1280x720)");
}

#[test]
fn test_sensor_geometry_round_trip() {
    for (w, h) in [(1280, 720), (640, 480), (1, 1)] {
        let events = decode(&synthetic_stream(), w, h).unwrap();
        assert_eq!(events.sensor_width(), w);
        assert_eq!(events.sensor_height(), h);
    }
}

#[test]
fn test_timestamps_monotonic_across_wraps() {
    // Walk TIME_HIGH through three full 12-bit cycles with an event at every
    // step, which crosses the 24-bit range of a raw fragment pair.
    let mut words = vec![0x0010, 0x3000];
    for cycle in 0..3u16 {
        for high in (0..4096u16).step_by(256) {
            words.push(0x8000 | high);
            words.push(0x6000 | (cycle * 100 + 7));
            words.push(0x2000 | (high & 0x7FF));
            words.push(0x4001);
        }
    }
    let events = decode(&to_bytes(&words), 1280, 720).unwrap();

    assert_eq!(events.len(), 3 * 16 * 2);
    assert_sorted(events.timestamp());
    assert!(*events.timestamp().last().unwrap() > 1 << 24);
}

#[test]
fn test_triggers_share_timebase() {
    let bytes = to_bytes(&[
        0x8002, // TIME_HIGH: 2
        0x6005, // TIME_LOW: 5
        0xA101, // EXT_TRIGGER: channel 1, rising
        0x0003, // ADDR_Y: 3
        0x2004, // ADDR_X: x=4
        0x6006, // TIME_LOW: 6
        0xA100, // EXT_TRIGGER: channel 1, falling
    ]);
    let (events, triggers) = decode_with_triggers(&bytes, 1280, 720).unwrap();

    assert_eq!(events.timestamp(), &[(2 << 12) + 5]);
    assert_eq!(triggers.channel(), &[1, 1]);
    assert_eq!(triggers.polarity(), &[1, 0]);
    assert_eq!(triggers.timestamp(), &[(2 << 12) + 5, (2 << 12) + 6]);
}

#[test]
fn test_malformed_inputs() {
    let odd = decode(&[0x00, 0x80, 0x01], 1280, 720).unwrap_err();
    assert!(matches!(odd, DecodeError::OddLength { len: 3 }));

    let reserved = decode(&to_bytes(&[0x8000, 0xB000]), 1280, 720).unwrap_err();
    assert!(matches!(
        reserved,
        DecodeError::UnknownWordType {
            nibble: 0xB,
            position: 1
        }
    ));

    let orphan_vector = decode(&to_bytes(&[0x4001]), 1280, 720).unwrap_err();
    assert!(matches!(orphan_vector, DecodeError::VectorWithoutBase { position: 0 }));

    assert!(odd.is_malformed() && reserved.is_malformed() && orphan_vector.is_malformed());
}

#[test]
fn test_lenient_mode_skips_reserved_words() {
    let mut decoder = Evt3Decoder::with_config(DecoderConfig::default().lenient());
    let (events, _) = decoder
        .decode_bytes(&to_bytes(&[0x8000, 0xC000, 0x292C]))
        .unwrap();
    assert_eq!(events.x(), &[300]);
    assert_eq!(decoder.stats().skipped_words, 1);
}

#[test]
fn test_missing_path_is_io_error() {
    let err = decode_from_path("/nonexistent/path/to/file.raw", 1280, 720).unwrap_err();
    assert!(matches!(err, DecodeError::Io(_)));
    assert!(!err.is_malformed());
}

#[test]
fn test_decode_from_path_strips_header() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"% evt 3.0\n% geometry 640x480\n% end\n").unwrap();
    file.write_all(&synthetic_stream()).unwrap();
    file.flush().unwrap();

    let events = decode_from_path(file.path(), 1280, 720).unwrap();
    assert_eq!(events.len(), 5);
    assert_eq!(events.sensor_size(), (1280, 720));

    // decode_file prefers the geometry recorded in the header
    let (events, _) = Evt3Decoder::new().decode_file(file.path()).unwrap();
    assert_eq!(events.sensor_size(), (640, 480));
    assert_eq!(events.len(), 5);
}

#[test]
fn test_decode_from_path_keeps_headerless_percent_byte() {
    // TIME_HIGH(37) starts with the byte 0x25, which is '%'
    let bytes = to_bytes(&[0x8025, 0x600A, 0x0001, 0x2007]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();

    let from_path = decode_from_path(file.path(), 1280, 720).unwrap();
    let from_bytes = decode(&bytes, 1280, 720).unwrap();
    assert_eq!(from_path.timestamp(), &[(37 << 12) | 10]);
    assert_eq!(from_path, from_bytes);
}

#[test]
fn test_headed_recording_starts_at_first_time_high() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"% evt 3.0\n% end\n").unwrap();
    // Leading vector word belongs to a packet cut off by the capture start
    file.write_all(&to_bytes(&[0x4001, 0x6050, 0x8001, 0x0002, 0x2003]))
        .unwrap();
    file.flush().unwrap();

    let mut decoder = Evt3Decoder::new();
    let (events, _) = decoder.decode_file(file.path()).unwrap();
    assert_eq!(events.x(), &[3]);
    assert_eq!(events.timestamp(), &[1 << 12]);
    assert_eq!(decoder.stats().unsynced_words, 2);

    let events = decode_from_path(file.path(), 1280, 720).unwrap();
    assert_eq!(events.x(), &[3]);

    let mut decoder = Evt3Decoder::with_config(DecoderConfig::default().sync_on_time_high(false));
    let err = decoder.decode_file(file.path()).unwrap_err();
    assert!(matches!(err, DecodeError::VectorWithoutBase { position: 0 }));
}

#[test]
fn test_time_high_repeats_never_move_time_back() {
    let bytes = to_bytes(&[0x8005, 0x6FA0, 0x0001, 0x2001, 0x8005, 0x2002]);
    let events = decode(&bytes, 1280, 720).unwrap();
    assert_eq!(events.timestamp(), &[24480, 24480]);

    let bytes = to_bytes(&[0x6064, 0x2001, 0x8000, 0x2002]);
    let events = decode(&bytes, 1280, 720).unwrap();
    assert_eq!(events.timestamp(), &[100, 100]);
}

#[test]
fn test_parallel_decodes_are_independent() {
    let bytes = synthetic_stream();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let bytes = bytes.clone();
            std::thread::spawn(move || decode(&bytes, 100 + i, 100).unwrap())
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let events = handle.join().unwrap();
        assert_eq!(events.x(), &[300, 400, 503, 504, 505]);
        assert_eq!(events.sensor_width(), 100 + i as u32);
    }
}

#[test]
fn test_csv_round_trip_on_disk() {
    let events = decode(&synthetic_stream(), 1280, 720).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");

    output::write_csv(&path, &events, FieldOrder::TXYP).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "%geometry:1280,720");
    assert_eq!(lines[1], "100,300,200,1");
    assert_eq!(lines.len(), 1 + events.len());
}

/// Test that the decoder can successfully decode a real EVT3 file.
#[test]
fn test_decode_real_file() {
    let test_path = Path::new(TEST_FILE);
    if !test_path.exists() {
        eprintln!("Skipping test: test file not found at {}", TEST_FILE);
        return;
    }

    let mut decoder = Evt3Decoder::new();
    let (events, _) = decoder
        .decode_file(test_path)
        .expect("Failed to decode file");

    assert_eq!(events.sensor_size(), (1280, 720));

    // laser.raw has ~116M events
    assert!(
        events.len() > 100_000_000,
        "Expected >100M events, got {}",
        events.len()
    );

    assert_sorted(events.timestamp());
    for (i, event) in events.iter().enumerate() {
        assert!(event.x < 1280, "Event {} x={} exceeds width", i, event.x);
        assert!(event.y < 720, "Event {} y={} exceeds height", i, event.y);
        assert!(event.polarity <= 1, "Event {} has invalid polarity", i);
    }
}

/// Binary output of a real recording.
#[test]
fn test_binary_output() {
    let test_path = Path::new(TEST_FILE);
    if !test_path.exists() {
        eprintln!("Skipping test: test file not found at {}", TEST_FILE);
        return;
    }

    let (events, _) = evt3_core::decode_file_with_triggers(test_path, 1280, 720)
        .expect("Failed to decode file");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.bin");
    output::write_binary(&path, &events).unwrap();

    let data = std::fs::read(&path).unwrap();
    assert_eq!(&data[0..8], b"EVT3BIN\0");
    let count = u64::from_le_bytes(data[20..28].try_into().unwrap());
    assert_eq!(count, events.len() as u64);
    assert_eq!(data.len() as u64, 28 + 14 * count);
}
