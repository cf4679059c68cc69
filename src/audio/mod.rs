//! Audio module - note decoding, additive synthesis and WAV input/output.

mod synth;
mod track;
mod wav;

pub use synth::{MASTER_VOLUME, Synthesizer};
pub use track::{NOTE_SIZE, Note, Track, Waveform};
pub use wav::{AudioError, TargetAudio, save_wav};
