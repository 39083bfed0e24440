//! End-to-end pipeline tests: register traffic or an event stream in,
//! output words out.

use soundcortex::{ChipSelect, SoundCortex, OUTPUT_BIAS};

#[cfg(feature = "sequencer")]
fn stream(track: &[u8]) -> Vec<u8> {
    let mut data = vec![b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1];
    data.extend_from_slice(&96u16.to_be_bytes());
    data.extend_from_slice(b"MTrk");
    data.extend_from_slice(&(track.len() as u32).to_be_bytes());
    data.extend_from_slice(track);
    data
}

#[test]
#[cfg(feature = "psg")]
fn register_writes_shape_square_output() {
    let mut cortex = SoundCortex::new();
    cortex.write(ChipSelect::Psg, 0x00, 100).unwrap();
    cortex.write(ChipSelect::Psg, 0x08, 0x0f).unwrap();
    cortex.write(ChipSelect::Psg, 0x07, 0x3e).unwrap(); // tone A only

    let mut seen = std::collections::BTreeSet::new();
    for _ in 0..10_000 {
        seen.insert(cortex.render_next_sample());
    }
    // A full-level square wave swings between the bias and bias + 0xff >> 3
    let high = OUTPUT_BIAS + (0xff >> 3);
    assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![OUTPUT_BIAS, high]);
}

#[test]
#[cfg(feature = "scc")]
fn wavetable_channel_reaches_output() {
    let mut cortex = SoundCortex::new();
    for entry in 0..32u8 {
        cortex.write(ChipSelect::Scc, entry, 0x7f).unwrap();
    }
    cortex.write(ChipSelect::Scc, 0xa0, 100).unwrap();
    cortex.write(ChipSelect::Scc, 0xaa, 0x0f).unwrap();
    cortex.write(ChipSelect::Scc, 0xaf, 0x1e).unwrap(); // channel 0 live

    // A constant waveform at full volume holds a constant output word
    let expected = OUTPUT_BIAS + ((127 * 15) >> 7);
    for _ in 0..1000 {
        assert_eq!(cortex.render_next_sample(), expected);
    }
}

#[test]
#[cfg(feature = "psg")]
fn version_identifiers_readable_through_device() {
    let cortex = SoundCortex::new();
    assert_eq!(cortex.read(ChipSelect::Psg, 0xfe).unwrap(), 1);
    assert_eq!(cortex.read(ChipSelect::Psg, 0xff).unwrap(), 1);
    assert!(cortex.read(ChipSelect::Psg, 0x42).is_err());
}

#[test]
#[cfg(feature = "sequencer")]
fn sequencer_drives_audible_output_then_silence() {
    use soundcortex::Sequencer;

    // One note held for a quarter note, released, track ends a quarter
    // note later
    let data = stream(&[
        0x00, 0x90, 60, 127, //
        0x60, 0x80, 60, 0, //
        0x60, 0xff, 0x2f, 0x00,
    ]);
    let mut cortex = SoundCortex::new();
    cortex.attach_sequencer(Sequencer::new(data).unwrap()).unwrap();

    let rate = cortex.sample_rate();
    let mut audible = 0u32;
    for _ in 0..rate {
        if cortex.render_next_sample() != OUTPUT_BIAS {
            audible += 1;
        }
    }
    assert!(audible > 1000, "held note produced only {} live samples", audible);

    // Second second: the note is released, then the track ends
    for _ in 0..rate {
        let _ = cortex.render_next_sample();
    }
    assert!(!cortex.sequencer_active());
    for _ in 0..1000 {
        assert_eq!(cortex.render_next_sample(), OUTPUT_BIAS);
    }
}

#[test]
#[cfg(feature = "sequencer")]
fn malformed_stream_never_activates() {
    use soundcortex::{CortexError, Sequencer};

    assert_eq!(
        Sequencer::new(b"not a midi file".to_vec()).unwrap_err(),
        CortexError::MalformedStream("stream shorter than header")
    );
    let result = Sequencer::new(b"RIFFxxxxWAVEfmt consequences".to_vec());
    assert!(matches!(result, Err(CortexError::MalformedStream(_))));
}

#[test]
#[cfg(feature = "sequencer")]
fn rendering_survives_unsupported_event() {
    use soundcortex::Sequencer;

    // A control-change event is not implemented; playback halts, the
    // render path keeps producing valid words
    let data = stream(&[0x00, 0x90, 60, 127, 0x10, 0xb0, 0x07, 0x40]);
    let mut cortex = SoundCortex::new();
    cortex.attach_sequencer(Sequencer::new(data).unwrap()).unwrap();

    for _ in 0..50_000 {
        assert!(cortex.render_next_sample() <= 255);
    }
    assert!(!cortex.sequencer_active());
}
