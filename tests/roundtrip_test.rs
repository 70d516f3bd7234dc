//! Integration tests for SSTV encode→decode round trips
//!
//! Exercises the complete pipeline: raster → tone train → 16-bit WAV →
//! sample stream → raster, for every supported mode.


use rustysstv::{decode, wav, DecoderConfig, Encoder, Raster, SstvError};
use test_utils::{channel_imbalance, init_test_tracing, mean_channels, solid_raster};

const FS: u32 = 48_000;

fn roundtrip(mode_name: &str, raster: &Raster) -> Raster {
    let encoder = Encoder::new(mode_name, FS).unwrap();
    let wav_bytes = encoder.encode_to_wav(raster).unwrap();
    let (samples, rate) = wav::decode_wav_bytes(&wav_bytes).unwrap();
    let result = decode(&samples, rate, &DecoderConfig::default()).unwrap();
    assert!(
        result.warnings.is_empty(),
        "clean round trip produced warnings: {:?}",
        result.warnings
    );
    assert_eq!(result.mode.name, Encoder::new(mode_name, FS).unwrap().mode().name);
    result.raster
}

#[test]
fn robot36_neutral_grey_round_trips() {
    init_test_tracing();
    let input = solid_raster(320, 240, 128, 128, 128);
    let decoded = roundtrip("ROBOT36", &input);

    let (r, g, b) = mean_channels(&decoded);
    for (name, mean) in [("R", r), ("G", g), ("B", b)] {
        assert!(
            (100.0..=150.0).contains(&mean),
            "channel {name} mean {mean} outside [100, 150]"
        );
    }
    let imbalance = channel_imbalance(&decoded);
    assert!(imbalance < 20.0, "grey decoded with imbalance {imbalance}");
}

#[test]
fn robot36_half_black_half_white() {
    init_test_tracing();
    let mut input = Raster::new_black(320, 240);
    for y in 0..240 {
        for x in 160..320 {
            input.set_rgb(x, y, 255, 255, 255);
        }
    }
    let decoded = roundtrip("ROBOT36", &input);

    let mut bright = 0usize;
    let mut max_brightness = 0f64;
    for y in 0..240 {
        for x in 0..320 {
            let (r, g, b, _) = decoded.get(x, y);
            let brightness = (r as f64 + g as f64 + b as f64) / 3.0;
            if brightness > 10.0 {
                bright += 1;
            }
            max_brightness = max_brightness.max(brightness);
        }
    }
    let total = 320 * 240;
    assert!(
        bright * 10 >= total,
        "only {bright} of {total} pixels brighter than 10"
    );
    assert!(max_brightness > 50.0, "max brightness {max_brightness}");
}

#[test]
fn robot36_colour_quadrants() {
    init_test_tracing();
    // top-left red, top-right green, bottom-left blue, bottom-right white
    let mut input = Raster::new_black(320, 240);
    for y in 0..240 {
        for x in 0..320 {
            let (r, g, b) = match (x < 160, y < 120) {
                (true, true) => (255, 0, 0),
                (false, true) => (0, 255, 0),
                (true, false) => (0, 0, 255),
                (false, false) => (255, 255, 255),
            };
            input.set_rgb(x, y, r, g, b);
        }
    }
    let decoded = roundtrip("ROBOT36", &input);

    let (r, g, b, _) = decoded.get(80, 60);
    assert!(r > 200 && g < 50 && b < 50, "red centre was ({r},{g},{b})");

    let (r, g, b, _) = decoded.get(240, 60);
    assert!(g > 150 && r < 180 && b < 50, "green centre was ({r},{g},{b})");

    let (r, g, b, _) = decoded.get(80, 180);
    assert!(b > 200 && r < 50 && g < 50, "blue centre was ({r},{g},{b})");

    let (r, g, b, _) = decoded.get(240, 180);
    assert!(
        r > 200 && g > 200 && b > 200,
        "white centre was ({r},{g},{b})"
    );
}

#[test]
fn martin_m1_grey_round_trips() {
    init_test_tracing();
    let input = solid_raster(320, 256, 128, 128, 128);
    let decoded = roundtrip("MARTIN1", &input);

    let (r, g, b) = mean_channels(&decoded);
    for (name, mean) in [("R", r), ("G", g), ("B", b)] {
        assert!(
            (mean - 128.0).abs() <= 30.0,
            "channel {name} mean {mean} drifted from 128"
        );
    }
    assert!(channel_imbalance(&decoded) < 20.0);
}

#[test]
fn scottie_s1_grey_round_trips() {
    init_test_tracing();
    let input = solid_raster(320, 256, 128, 128, 128);
    let decoded = roundtrip("SCOTTIE1", &input);

    let (r, g, b) = mean_channels(&decoded);
    for (name, mean) in [("R", r), ("G", g), ("B", b)] {
        assert!(
            (mean - 128.0).abs() <= 30.0,
            "channel {name} mean {mean} drifted from 128"
        );
    }
    assert!(channel_imbalance(&decoded) < 20.0);
}

#[test]
fn martin_m1_primary_bars() {
    init_test_tracing();
    // three vertical bars straight through the G-B-R channel scans
    let mut input = Raster::new_black(320, 256);
    for y in 0..256 {
        for x in 0..320 {
            let (r, g, b) = match x {
                0..=105 => (230, 20, 20),
                106..=212 => (20, 230, 20),
                _ => (20, 20, 230),
            };
            input.set_rgb(x, y, r, g, b);
        }
    }
    let decoded = roundtrip("MARTIN1", &input);

    let (r, g, b, _) = decoded.get(53, 128);
    assert!(r > 180 && g < 80 && b < 80, "red bar was ({r},{g},{b})");
    let (r, g, b, _) = decoded.get(159, 128);
    assert!(g > 180 && r < 80 && b < 80, "green bar was ({r},{g},{b})");
    let (r, g, b, _) = decoded.get(266, 128);
    assert!(b > 180 && r < 80 && g < 80, "blue bar was ({r},{g},{b})");
}

#[test]
fn decoded_alpha_is_opaque_everywhere() {
    init_test_tracing();
    let input = solid_raster(320, 240, 90, 160, 40);
    let decoded = roundtrip("ROBOT36", &input);
    for y in 0..240 {
        for x in 0..320 {
            assert_eq!(decoded.get(x, y).3, 255, "alpha at ({x},{y})");
        }
    }
}

#[test]
fn decoding_the_same_wav_twice_is_byte_identical() {
    init_test_tracing();
    let input = solid_raster(320, 240, 70, 120, 190);
    let encoder = Encoder::new("ROBOT36", FS).unwrap();
    let wav_bytes = encoder.encode_to_wav(&input).unwrap();
    let (samples, rate) = wav::decode_wav_bytes(&wav_bytes).unwrap();

    let first = decode(&samples, rate, &DecoderConfig::default()).unwrap();
    let second = decode(&samples, rate, &DecoderConfig::default()).unwrap();
    assert_eq!(
        first.raster.as_bytes(),
        second.raster.as_bytes(),
        "decode must be deterministic"
    );
}

#[test]
fn truncated_audio_yields_partial_raster_and_warning() {
    init_test_tracing();
    let input = solid_raster(320, 240, 200, 200, 200);
    let encoder = Encoder::new("ROBOT36", FS).unwrap();
    let mut samples = encoder.encode(&input).unwrap();
    samples.truncate(samples.len() * 6 / 10);

    let result = decode(&samples, FS, &DecoderConfig::default()).unwrap();
    let truncated = result
        .warnings
        .iter()
        .find_map(|w| match w {
            SstvError::TruncatedInput {
                lines_decoded,
                expected_lines,
            } => Some((*lines_decoded, *expected_lines)),
            _ => None,
        })
        .expect("expected a TruncatedInput warning");
    assert_eq!(truncated.1, 240);
    assert!(truncated.0 > 100 && truncated.0 < 240, "decoded {} lines", truncated.0);

    // the decoded top is bright, the missing bottom stays black
    let (r, g, b, _) = result.raster.get(160, 20);
    assert!(r > 150 && g > 150 && b > 150, "top was ({r},{g},{b})");
    let (r, g, b, _) = result.raster.get(160, 235);
    assert!(r < 30 && g < 30 && b < 30, "bottom was ({r},{g},{b})");
}
