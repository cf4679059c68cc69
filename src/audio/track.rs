//! Note codec - decoding gene bytes into playable tracks.
//!
//! A track is a flat sequence of fixed-size note records. Each record is
//! [`NOTE_SIZE`] bytes, little-endian scalars at fixed offsets:
//!
//! ```text
//! Offset  Type  Field      Scaling
//! 0..4    u32   start      raw * song_max_duration / u32::MAX  (seconds)
//! 4       u8    waveform   raw % 4
//! 5..9    u32   frequency  raw * frequency_max / u32::MAX      (Hz)
//! 9       u8    volume     raw / 255                           ([0, 1])
//! 10..12  u16   duration   raw * note_max_duration / u16::MAX  (seconds)
//! ```
//!
//! Every byte pattern decodes to a valid track, so genetic operators never
//! need to repair genomes.

use std::f64::consts::TAU;

use crate::schema::ScalingParams;

/// Size of one encoded note record in bytes.
pub const NOTE_SIZE: usize = 12;

/// Oscillator shape for a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Map a gene byte onto a waveform. Total: out-of-range bytes wrap.
    #[inline]
    pub fn from_byte(byte: u8) -> Self {
        match byte % 4 {
            0 => Waveform::Sine,
            1 => Waveform::Square,
            2 => Waveform::Triangle,
            _ => Waveform::Sawtooth,
        }
    }

    /// Sample the waveform at `time` seconds into the note, in [-1, 1].
    #[inline]
    pub fn sample(self, time: f64, frequency: f64) -> f64 {
        match self {
            Waveform::Sine => (TAU * time * frequency).sin(),
            Waveform::Square => {
                let phase = cycle_phase(time, frequency);
                if phase > 0.5 {
                    1.0
                } else if phase < 0.5 {
                    -1.0
                } else {
                    0.0
                }
            }
            Waveform::Triangle => (4.0 * cycle_phase(time, frequency) - 2.0).abs() - 1.0,
            Waveform::Sawtooth => 2.0 * cycle_phase(time, frequency) - 1.0,
        }
    }
}

/// Position within the current cycle, in [0, 1). A zero frequency has an
/// infinite period and pins the phase to 0.
#[inline]
fn cycle_phase(time: f64, frequency: f64) -> f64 {
    (time % (1.0 / frequency)) * frequency
}

/// One decoded note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Start time in seconds from the beginning of the track.
    pub time: f64,
    /// Oscillator shape.
    pub waveform: Waveform,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Amplitude in [0, 1].
    pub volume: f64,
    /// Length in seconds.
    pub duration: f64,
}

impl Note {
    /// Decode one record. `record` must hold at least [`NOTE_SIZE`] bytes.
    fn decode(record: &[u8], params: &ScalingParams) -> Self {
        let start = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        let frequency = u32::from_le_bytes([record[5], record[6], record[7], record[8]]);
        let duration = u16::from_le_bytes([record[10], record[11]]);
        Note {
            time: f64::from(start) * params.song_max_duration / f64::from(u32::MAX),
            waveform: Waveform::from_byte(record[4]),
            frequency: f64::from(frequency) * params.frequency_max / f64::from(u32::MAX),
            volume: f64::from(record[9]) / f64::from(u8::MAX),
            duration: f64::from(duration) * params.note_max_duration / f64::from(u16::MAX),
        }
    }

    /// End of the note in seconds from the beginning of the track.
    #[inline]
    pub fn end(&self) -> f64 {
        self.time + self.duration
    }
}

/// A decoded sequence of notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    notes: Vec<Note>,
}

impl Track {
    /// Decode a byte sequence into a fresh track. A trailing partial record
    /// is ignored; empty input yields an empty track.
    pub fn decode(bytes: &[u8], params: &ScalingParams) -> Self {
        let mut track = Track::default();
        track.decode_into(bytes, params);
        track
    }

    /// Decode into this track, reusing its note storage.
    pub fn decode_into(&mut self, bytes: &[u8], params: &ScalingParams) {
        self.notes.clear();
        self.notes.extend(
            bytes
                .chunks_exact(NOTE_SIZE)
                .map(|record| Note::decode(record, params)),
        );
    }

    /// Decoded notes in gene order.
    #[inline]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Track duration in seconds: the latest note end, 0 for an empty track.
    pub fn duration(&self) -> f64 {
        self.notes.iter().map(Note::end).fold(0.0, f64::max)
    }

    /// Samples needed to hold the whole track at `sample_rate`, truncated.
    pub fn sample_count(&self, sample_rate: u32) -> usize {
        (self.duration() * f64::from(sample_rate)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ScalingParams {
        ScalingParams {
            song_max_duration: 60.0,
            note_max_duration: 5.0,
            frequency_max: 24_000.0,
        }
    }

    #[test]
    fn zero_record_decodes_to_zero_note() {
        let track = Track::decode(&[0u8; NOTE_SIZE], &params());
        assert_eq!(track.len(), 1);
        let note = track.notes()[0];
        assert_eq!(note.time, 0.0);
        assert_eq!(note.waveform, Waveform::Sine);
        assert_eq!(note.frequency, 0.0);
        assert_eq!(note.volume, 0.0);
        assert_eq!(note.duration, 0.0);
        assert_eq!(track.duration(), 0.0);
    }

    #[test]
    fn saturated_record_decodes_to_scaling_maxima() {
        let track = Track::decode(&[0xFF; NOTE_SIZE], &params());
        let note = track.notes()[0];
        assert_eq!(note.time, 60.0);
        assert_eq!(note.waveform, Waveform::Sawtooth);
        assert_eq!(note.frequency, 24_000.0);
        assert_eq!(note.volume, 1.0);
        assert_eq!(note.duration, 5.0);
    }

    #[test]
    fn note_count_matches_record_count() {
        let bytes = vec![7u8; NOTE_SIZE * 5];
        assert_eq!(Track::decode(&bytes, &params()).len(), 5);
    }

    #[test]
    fn trailing_partial_record_is_ignored() {
        let bytes = vec![1u8; NOTE_SIZE * 2 + 7];
        assert_eq!(Track::decode(&bytes, &params()).len(), 2);
    }

    #[test]
    fn empty_bytes_decode_to_empty_track() {
        let track = Track::decode(&[], &params());
        assert!(track.is_empty());
        assert_eq!(track.duration(), 0.0);
        assert_eq!(track.sample_count(48_000), 0);
    }

    #[test]
    fn waveform_byte_wraps_modulo_four() {
        assert_eq!(Waveform::from_byte(0), Waveform::Sine);
        assert_eq!(Waveform::from_byte(1), Waveform::Square);
        assert_eq!(Waveform::from_byte(2), Waveform::Triangle);
        assert_eq!(Waveform::from_byte(3), Waveform::Sawtooth);
        assert_eq!(Waveform::from_byte(6), Waveform::Triangle);
        assert_eq!(Waveform::from_byte(0xFF), Waveform::Sawtooth);
    }

    #[test]
    fn decode_is_deterministic() {
        let bytes: Vec<u8> = (0..NOTE_SIZE as u8 * 4).collect();
        assert_eq!(
            Track::decode(&bytes, &params()),
            Track::decode(&bytes, &params())
        );
    }

    #[test]
    fn decode_into_reuses_storage() {
        let mut track = Track::decode(&[3u8; NOTE_SIZE * 8], &params());
        track.decode_into(&[9u8; NOTE_SIZE], &params());
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn duration_is_latest_note_end() {
        // First record ends later than the second starts.
        let mut bytes = vec![0u8; NOTE_SIZE * 2];
        bytes[10] = 0xFF;
        bytes[11] = 0xFF; // duration = 5s at time 0
        bytes[NOTE_SIZE] = 0x01; // tiny nonzero start, zero duration
        let track = Track::decode(&bytes, &params());
        assert_eq!(track.duration(), 5.0);
        assert_eq!(track.sample_count(48_000), 240_000);
    }

    #[test]
    fn sine_starts_at_zero() {
        assert_eq!(Waveform::Sine.sample(0.0, 440.0), 0.0);
    }

    #[test]
    fn square_switches_at_half_cycle() {
        // 1 Hz: first half of the cycle low, second half high.
        assert_eq!(Waveform::Square.sample(0.25, 1.0), -1.0);
        assert_eq!(Waveform::Square.sample(0.75, 1.0), 1.0);
        assert_eq!(Waveform::Square.sample(0.5, 1.0), 0.0);
    }

    #[test]
    fn triangle_and_sawtooth_span_unit_range() {
        assert_eq!(Waveform::Triangle.sample(0.0, 1.0), 1.0);
        assert_eq!(Waveform::Triangle.sample(0.5, 1.0), -1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.0, 1.0), -1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.5, 1.0), 0.0);
    }

    #[test]
    fn zero_frequency_pins_phase() {
        assert_eq!(Waveform::Sine.sample(1.0, 0.0), 0.0);
        assert_eq!(Waveform::Sawtooth.sample(1.0, 0.0), -1.0);
    }
}
