//! Spectral signatures for comparing audio.
//!
//! A signature is the concatenated half-spectrum of consecutive
//! [`BLOCK_SIZE`]-sample blocks: each block is transformed with a forward
//! FFT and the first [`BINS_PER_BLOCK`] complex bins are kept (the upper
//! half mirrors the lower for real input). The final short block is
//! zero-padded. Distance between two signatures is the summed squared
//! difference of bin magnitudes, component-wise; where one signature is
//! longer, its tail is measured against silence.

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Samples per analysis block.
pub const BLOCK_SIZE: usize = 256;

/// Complex bins retained per block.
pub const BINS_PER_BLOCK: usize = BLOCK_SIZE / 2;

/// Frequency-domain fingerprint of a sample buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    bins: Vec<Complex<f64>>,
}

impl Signature {
    /// Retained bins, [`BINS_PER_BLOCK`] per analyzed block.
    #[inline]
    pub fn bins(&self) -> &[Complex<f64>] {
        &self.bins
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Number of blocks this signature was built from.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.bins.len() / BINS_PER_BLOCK
    }
}

/// Signature builder with a cached FFT plan and reusable block buffers.
pub struct SpectrumAnalyzer {
    // Plan creation is expensive; one plan serves every block.
    fft: Arc<dyn Fft<f64>>,
    block: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(BLOCK_SIZE);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            fft,
            block: vec![Complex::new(0.0, 0.0); BLOCK_SIZE],
            scratch,
        }
    }

    /// Build a signature into a fresh buffer.
    pub fn signature(&mut self, samples: &[i16]) -> Signature {
        let mut signature = Signature::default();
        self.signature_into(samples, &mut signature);
        signature
    }

    /// Build a signature into `out`, reusing its bin storage.
    pub fn signature_into(&mut self, samples: &[i16], out: &mut Signature) {
        out.bins.clear();
        out.bins
            .reserve(samples.len().div_ceil(BLOCK_SIZE) * BINS_PER_BLOCK);

        for chunk in samples.chunks(BLOCK_SIZE) {
            for (slot, &sample) in self.block.iter_mut().zip(chunk) {
                *slot = Complex::new(f64::from(sample) / 32_768.0, 0.0);
            }
            // Zero-pad the final short block.
            for slot in self.block.iter_mut().skip(chunk.len()) {
                *slot = Complex::new(0.0, 0.0);
            }
            self.fft
                .process_with_scratch(&mut self.block, &mut self.scratch);
            out.bins.extend_from_slice(&self.block[..BINS_PER_BLOCK]);
        }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Summed squared magnitude difference between two signatures.
///
/// Zero iff the signatures are identical in magnitude; the tail of the
/// longer signature counts in full, as if compared against silence.
pub fn distance(a: &Signature, b: &Signature) -> f64 {
    let common = a.bins.len().min(b.bins.len());
    let mut total = 0.0;
    for (x, y) in a.bins[..common].iter().zip(&b.bins[..common]) {
        let re = x.re.abs() - y.re.abs();
        let im = x.im.abs() - y.im.abs();
        total += re * re + im * im;
    }
    let tail = if a.bins.len() > common {
        &a.bins[common..]
    } else {
        &b.bins[common..]
    };
    for bin in tail {
        total += bin.re * bin.re + bin.im * bin.im;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(cycles: usize, count: usize, amplitude: f64) -> Vec<i16> {
        (0..count)
            .map(|i| {
                let phase = std::f64::consts::TAU * cycles as f64 * i as f64 / count as f64;
                (phase.sin() * amplitude) as i16
            })
            .collect()
    }

    #[test]
    fn signature_covers_every_block() {
        let mut analyzer = SpectrumAnalyzer::new();
        let signature = analyzer.signature(&vec![0i16; 600]);
        assert_eq!(signature.block_count(), 3);
        assert_eq!(signature.len(), 3 * BINS_PER_BLOCK);
    }

    #[test]
    fn silence_yields_zero_bins() {
        let mut analyzer = SpectrumAnalyzer::new();
        let signature = analyzer.signature(&vec![0i16; BLOCK_SIZE * 2]);
        assert!(signature.bins().iter().all(|b| b.re == 0.0 && b.im == 0.0));
    }

    #[test]
    fn identical_buffers_have_zero_distance() {
        let samples = tone(8, BLOCK_SIZE * 2, 12_000.0);
        let mut analyzer = SpectrumAnalyzer::new();
        let a = analyzer.signature(&samples);
        let b = analyzer.signature(&samples);
        assert_eq!(distance(&a, &b), 0.0);
    }

    #[test]
    fn distance_is_symmetric_across_lengths() {
        let mut analyzer = SpectrumAnalyzer::new();
        let a = analyzer.signature(&tone(4, BLOCK_SIZE * 3, 9_000.0));
        let b = analyzer.signature(&tone(9, BLOCK_SIZE, 5_000.0));
        assert_eq!(distance(&a, &b), distance(&b, &a));
    }

    #[test]
    fn longer_tail_counts_against_silence() {
        let mut analyzer = SpectrumAnalyzer::new();
        let long = analyzer.signature(&tone(8, BLOCK_SIZE * 2, 10_000.0));
        let short = analyzer.signature(&[]);
        assert!(short.is_empty());
        let expected: f64 = long.bins().iter().map(|b| b.norm_sqr()).sum();
        assert_eq!(distance(&long, &short), expected);
    }

    #[test]
    fn dc_bin_holds_block_sum() {
        let mut analyzer = SpectrumAnalyzer::new();
        let signature = analyzer.signature(&vec![1_000i16; BLOCK_SIZE]);
        let expected = BLOCK_SIZE as f64 * 1_000.0 / 32_768.0;
        assert!((signature.bins()[0].re - expected).abs() < 1e-9);
        assert!(signature.bins()[0].im.abs() < 1e-9);
    }

    #[test]
    fn short_block_matches_explicit_zero_padding() {
        let mut analyzer = SpectrumAnalyzer::new();
        let mut samples = tone(5, 300, 11_000.0);
        let short = analyzer.signature(&samples);
        samples.resize(BLOCK_SIZE * 2, 0);
        let padded = analyzer.signature(&samples);
        assert_eq!(short, padded);
    }

    #[test]
    fn pure_tone_peaks_at_its_bin() {
        let samples = tone(8, BLOCK_SIZE, 14_000.0);
        let mut analyzer = SpectrumAnalyzer::new();
        let signature = analyzer.signature(&samples);
        let peak = signature
            .bins()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm_sqr().total_cmp(&b.1.norm_sqr()))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(8));
    }

    #[test]
    fn reused_buffer_matches_fresh_signature() {
        let samples = tone(3, 700, 7_000.0);
        let mut analyzer = SpectrumAnalyzer::new();
        let fresh = analyzer.signature(&samples);
        let mut reused = analyzer.signature(&vec![42i16; 2_000]);
        analyzer.signature_into(&samples, &mut reused);
        assert_eq!(fresh, reused);
    }
}
