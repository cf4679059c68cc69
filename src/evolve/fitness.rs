//! Spectral fitness evaluation.
//!
//! A chromosome's fitness is `FITNESS_SCALE / distance`, where distance is
//! the spectral distance between the candidate's rendered audio and the
//! target recording. The target signature is computed once per run and
//! shared read-only; each worker thread evaluates through its own
//! [`EvalScratch`], so steady-state evaluation performs no allocation.

use std::sync::Arc;

use crate::audio::{Synthesizer, TargetAudio, Track};
use crate::evolve::chromosome::Chromosome;
use crate::schema::ScalingParams;
use crate::spectral::{Signature, SpectrumAnalyzer, distance};

/// Numerator of the distance-to-fitness mapping.
pub const FITNESS_SCALE: f64 = 1.0e9;

/// Per-thread working space: decoded track, synthesizer buffers, analyzer
/// plan and the candidate signature, all reused across evaluations.
pub struct EvalScratch {
    track: Track,
    synth: Synthesizer,
    analyzer: SpectrumAnalyzer,
    signature: Signature,
}

/// Scores chromosomes against one target recording.
#[derive(Clone)]
pub struct FitnessEvaluator {
    target: Arc<Signature>,
    scaling: ScalingParams,
    sample_rate: u32,
    sample_count: usize,
    length_weighted: bool,
}

impl FitnessEvaluator {
    /// Build from an already-computed target signature.
    pub fn new(
        target: Arc<Signature>,
        scaling: ScalingParams,
        sample_rate: u32,
        sample_count: usize,
        length_weighted: bool,
    ) -> Self {
        Self {
            target,
            scaling,
            sample_rate,
            sample_count,
            length_weighted,
        }
    }

    /// Build from a target recording, computing its signature here.
    pub fn for_target(target: &TargetAudio, scaling: ScalingParams, length_weighted: bool) -> Self {
        let signature = SpectrumAnalyzer::new().signature(target.samples());
        Self::new(
            Arc::new(signature),
            scaling,
            target.sample_rate(),
            target.sample_count(),
            length_weighted,
        )
    }

    /// The shared target signature.
    #[inline]
    pub fn target(&self) -> &Signature {
        &self.target
    }

    /// Note decode scaling this evaluator applies.
    #[inline]
    pub fn scaling(&self) -> &ScalingParams {
        &self.scaling
    }

    /// Fresh working space sized for this evaluator's target.
    pub fn make_scratch(&self) -> EvalScratch {
        EvalScratch {
            track: Track::default(),
            synth: Synthesizer::new(self.sample_rate, self.sample_count),
            analyzer: SpectrumAnalyzer::new(),
            signature: Signature::default(),
        }
    }

    /// Map a spectral distance onto a fitness value: strictly decreasing,
    /// with an exact match pinned to the maximum representable value.
    #[inline]
    pub fn fitness_from_distance(distance: f64) -> f64 {
        if distance > 0.0 {
            FITNESS_SCALE / distance
        } else {
            f64::MAX
        }
    }

    /// Score one chromosome. A chromosome whose decoded track has zero
    /// duration scores exactly 0: silence never outranks an evaluated track.
    pub fn evaluate(&self, chromosome: &Chromosome, scratch: &mut EvalScratch) -> f64 {
        scratch
            .track
            .decode_into(chromosome.genes(), &self.scaling);
        if scratch.track.sample_count(self.sample_rate) == 0 {
            return 0.0;
        }
        let samples = scratch.synth.render(&scratch.track);
        scratch.analyzer.signature_into(samples, &mut scratch.signature);
        let fitness = Self::fitness_from_distance(distance(&self.target, &scratch.signature));
        if self.length_weighted && fitness < f64::MAX {
            (fitness * chromosome.len() as f64).min(f64::MAX)
        } else {
            fitness
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NOTE_SIZE;
    use crate::evolve::operators::EvoRng;

    fn scaling() -> ScalingParams {
        ScalingParams {
            song_max_duration: 0.1,
            note_max_duration: 0.1,
            frequency_max: 2_000.0,
        }
    }

    fn tone_target(count: usize) -> TargetAudio {
        let samples = (0..count)
            .map(|i| {
                let phase = std::f64::consts::TAU * 440.0 * i as f64 / 8_000.0;
                (phase.sin() * 10_000.0) as i16
            })
            .collect();
        TargetAudio::from_samples(samples, 8_000).unwrap()
    }

    fn noisy_chromosome(seed: u64) -> Chromosome {
        let mut rng = EvoRng::new(seed);
        let mut c = Chromosome::empty();
        let mut bytes = vec![0u8; NOTE_SIZE * 4];
        rng.fill_bytes(&mut bytes);
        c.splice(&bytes, &[]);
        c
    }

    #[test]
    fn fitness_decreases_with_distance() {
        let f1 = FitnessEvaluator::fitness_from_distance(1.0);
        let f2 = FitnessEvaluator::fitness_from_distance(2.0);
        assert_eq!(f1, FITNESS_SCALE);
        assert_eq!(f2, FITNESS_SCALE / 2.0);
        assert!(f1 > f2);
    }

    #[test]
    fn zero_distance_maps_to_max() {
        assert_eq!(FitnessEvaluator::fitness_from_distance(0.0), f64::MAX);
    }

    #[test]
    fn zero_duration_track_scores_zero() {
        let evaluator = FitnessEvaluator::for_target(&tone_target(800), scaling(), false);
        let mut scratch = evaluator.make_scratch();
        let mut c = Chromosome::empty();
        c.splice(&[0u8; NOTE_SIZE], &[]);
        assert_eq!(evaluator.evaluate(&c, &mut scratch), 0.0);
    }

    #[test]
    fn rendering_the_target_itself_scores_max() {
        // Build the target out of a chromosome's own rendering, so the
        // candidate reproduces it sample for sample.
        let chromosome = noisy_chromosome(21);
        let params = scaling();
        let mut track = Track::default();
        track.decode_into(chromosome.genes(), &params);
        assert!(track.sample_count(8_000) > 0);
        let mut synth = Synthesizer::new(8_000, 700);
        let target =
            TargetAudio::from_samples(synth.render(&track).to_vec(), 8_000).unwrap();

        let evaluator = FitnessEvaluator::for_target(&target, params, false);
        let mut scratch = evaluator.make_scratch();
        assert_eq!(evaluator.evaluate(&chromosome, &mut scratch), f64::MAX);
    }

    #[test]
    fn mismatched_chromosome_scores_finite_positive() {
        let evaluator = FitnessEvaluator::for_target(&tone_target(800), scaling(), false);
        let mut scratch = evaluator.make_scratch();
        let fitness = evaluator.evaluate(&noisy_chromosome(3), &mut scratch);
        assert!(fitness > 0.0);
        assert!(fitness < f64::MAX);
    }

    #[test]
    fn length_weighting_scales_by_gene_count() {
        let chromosome = noisy_chromosome(5);
        let target = tone_target(800);
        let plain = FitnessEvaluator::for_target(&target, scaling(), false);
        let weighted = FitnessEvaluator::for_target(&target, scaling(), true);
        let base = plain.evaluate(&chromosome, &mut plain.make_scratch());
        let boosted = weighted.evaluate(&chromosome, &mut weighted.make_scratch());
        assert_eq!(boosted, base * chromosome.len() as f64);
    }

    #[test]
    fn scratch_reuse_does_not_leak_state() {
        let evaluator = FitnessEvaluator::for_target(&tone_target(800), scaling(), false);
        let mut scratch = evaluator.make_scratch();
        let a = noisy_chromosome(1);
        let b = noisy_chromosome(2);
        let first = evaluator.evaluate(&a, &mut scratch);
        evaluator.evaluate(&b, &mut scratch);
        assert_eq!(evaluator.evaluate(&a, &mut scratch), first);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let evaluator = FitnessEvaluator::for_target(&tone_target(1_000), scaling(), false);
        let c = noisy_chromosome(9);
        let one = evaluator.evaluate(&c, &mut evaluator.make_scratch());
        let two = evaluator.evaluate(&c, &mut evaluator.make_scratch());
        assert_eq!(one, two);
    }
}
