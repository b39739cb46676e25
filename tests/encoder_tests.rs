//! Encoder tests: pulse timing, gaps, and sequence-level failure.

use rust_pulse_link::encoder::{PulseEncoder, SendError};
use rust_pulse_link::sim::{RecordingLine, SimClock, VirtualDelay};
use rust_pulse_link::timing::LinkConfig;

fn encoder(clock: &SimClock) -> (PulseEncoder<RecordingLine, VirtualDelay>, RecordingLine) {
    let line = RecordingLine::new(clock.clone());
    let encoder = PulseEncoder::new(
        line.clone(),
        VirtualDelay::new(clock.clone()),
        LinkConfig::for_unit(100),
    );
    (encoder, line)
}

#[test]
fn test_short_pulse_timing() {
    let clock = SimClock::new();
    let (mut enc, line) = encoder(&clock);

    enc.send_sequence("0").unwrap();

    // 1 unit high, then the mandatory 1-unit element gap.
    assert_eq!(line.timeline().high_pulses(), vec![(0, 100)]);
    assert_eq!(clock.millis(), 200);
}

#[test]
fn test_long_pulse_timing() {
    let clock = SimClock::new();
    let (mut enc, line) = encoder(&clock);

    enc.send_sequence("1").unwrap();

    assert_eq!(line.timeline().high_pulses(), vec![(0, 300)]);
    assert_eq!(clock.millis(), 400);
}

#[test]
fn test_letter_gap_is_silence() {
    let clock = SimClock::new();
    let (mut enc, line) = encoder(&clock);

    enc.send_sequence(" ").unwrap();

    // 3 units low, no pulse, no extra element gap.
    assert_eq!(line.timeline().pulse_count(), 0);
    assert_eq!(clock.millis(), 300);
}

#[test]
fn test_word_gap_is_silence() {
    let clock = SimClock::new();
    let (mut enc, line) = encoder(&clock);

    enc.send_sequence("|").unwrap();

    assert_eq!(line.timeline().pulse_count(), 0);
    assert_eq!(clock.millis(), 700);
}

#[test]
fn test_element_gap_separates_pulses() {
    let clock = SimClock::new();
    let (mut enc, line) = encoder(&clock);

    enc.send_sequence("00").unwrap();

    // Second pulse starts one unit after the first ended.
    assert_eq!(line.timeline().high_pulses(), vec![(0, 100), (200, 300)]);
}

#[test]
fn test_line_low_after_sequence() {
    let clock = SimClock::new();
    let (mut enc, line) = encoder(&clock);

    enc.send_sequence("101 | 0").unwrap();

    let timeline = line.timeline();
    assert!(!timeline.level_at(timeline.end_ms() + 1));
}

#[test]
fn test_invalid_character_aborts() {
    let clock = SimClock::new();
    let (mut enc, line) = encoder(&clock);

    let result = enc.send_sequence("10X1");
    assert_eq!(
        result,
        Err(SendError::InvalidCharacter { index: 2, ch: 'X' })
    );

    // '1' and '0' were keyed; the trailing '1' never was.
    let pulses = line.timeline().high_pulses();
    assert_eq!(pulses, vec![(0, 300), (400, 500)]);

    // Time stops at the element gap after '0': nothing ran past the error.
    assert_eq!(clock.millis(), 600);
}

#[test]
fn test_error_names_position_and_char() {
    let clock = SimClock::new();
    let (mut enc, _line) = encoder(&clock);

    match enc.send_sequence("0a") {
        Err(SendError::InvalidCharacter { index, ch }) => {
            assert_eq!(index, 1);
            assert_eq!(ch, 'a');
        }
        other => panic!("expected invalid character error, got {:?}", other),
    }
}

#[test]
fn test_empty_sequence_is_ok() {
    let clock = SimClock::new();
    let (mut enc, line) = encoder(&clock);

    enc.send_sequence("").unwrap();
    assert_eq!(line.timeline().pulse_count(), 0);
    assert_eq!(clock.millis(), 0);
}
