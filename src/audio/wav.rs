//! WAV input/output for target recordings and evolved results.

use std::path::Path;

/// Audio file errors.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error(transparent)]
    Wav(#[from] hound::Error),
    #[error("Target recording must be mono, got {0} channels")]
    NotMono(u16),
    #[error("Target recording contains no samples")]
    Empty,
}

/// The recording candidates are evolved toward, held as mono 16-bit samples.
#[derive(Debug, Clone)]
pub struct TargetAudio {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl TargetAudio {
    /// Load a mono WAV file. Integer formats of any bit depth and 32-bit
    /// float are rescaled to the engine's 16-bit range.
    pub fn load(path: &Path) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.channels != 1 {
            return Err(AudioError::NotMono(spec.channels));
        }

        let samples = match spec.sample_format {
            hound::SampleFormat::Int => {
                // Full scale of the source depth maps onto full i16 scale.
                let max = 1_i64 << (spec.bits_per_sample - 1);
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| (i64::from(x) * 32_768 / max) as i16))
                    .collect::<Result<Vec<_>, _>>()?
            }
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| {
                    s.map(|x| (f64::from(x) * f64::from(i16::MAX)).clamp(-32_768.0, 32_767.0) as i16)
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        Self::from_samples(samples, spec.sample_rate)
    }

    /// Wrap raw samples, rejecting an empty recording.
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> Result<Self, AudioError> {
        if samples.is_empty() {
            return Err(AudioError::Empty);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    #[inline]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Recording length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Write samples as a mono 16-bit PCM WAV file.
pub fn save_wav(samples: &[i16], sample_rate: u32, path: &Path) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<i16> = (0..64).map(|i| (i * 37) - 800).collect();
        save_wav(&samples, 8_000, &path).unwrap();

        let target = TargetAudio::load(&path).unwrap();
        assert_eq!(target.sample_rate(), 8_000);
        assert_eq!(target.samples(), samples.as_slice());
        assert_eq!(target.duration_seconds(), 64.0 / 8_000.0);
    }

    #[test]
    fn rejects_stereo_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [1_i16, -1, 2, -2] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        assert!(matches!(
            TargetAudio::load(&path),
            Err(AudioError::NotMono(2))
        ));
    }

    #[test]
    fn rejects_empty_recording() {
        assert!(matches!(
            TargetAudio::from_samples(Vec::new(), 8_000),
            Err(AudioError::Empty)
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        save_wav(&[], 8_000, &path).unwrap();
        assert!(matches!(TargetAudio::load(&path), Err(AudioError::Empty)));
    }

    #[test]
    fn rescales_24_bit_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 24,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0x7F_FFFF_i32, -0x80_0000, 0x10_0000] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let target = TargetAudio::load(&path).unwrap();
        assert_eq!(target.samples(), &[32_767, -32_768, 0x1000]);
    }

    #[test]
    fn rescales_float_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.5_f32, -1.0, 0.0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let target = TargetAudio::load(&path).unwrap();
        assert_eq!(target.samples(), &[16_383, -32_767, 0]);
    }
}
