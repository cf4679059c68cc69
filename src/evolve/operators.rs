//! Genetic operators: selection, crossover and mutation.
//!
//! Every operator works on whole note records, so genomes stay decodable
//! without repair. All randomness flows through [`EvoRng`] streams seeded
//! per island and per worker thread; identical seeds replay identical runs.

use rand::prelude::*;

use crate::audio::NOTE_SIZE;
use crate::evolve::chromosome::{Chromosome, MAX_GENES};
use crate::evolve::population::best_index;

/// Seed distance between island ranks.
const RANK_SEED_STRIDE: u64 = 1999;

/// Seeded random stream for genome operations.
pub struct EvoRng {
    rng: StdRng,
}

impl EvoRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Master stream for an island: `base_seed + rank * 1999`.
    pub fn for_rank(base_seed: u64, rank: usize) -> Self {
        Self::new(base_seed.wrapping_add(rank as u64 * RANK_SEED_STRIDE))
    }

    /// Derive a seed for an independent stream.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Uniform draw from [0, 1).
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen()
    }

    /// Bernoulli draw: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.r#gen::<f64>() < p
    }

    /// Uniform index into `0..len`. Every index, the last included, is
    /// equally likely.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Uniform draw from `min..=max`.
    pub fn range(&mut self, min: usize, max: usize) -> usize {
        self.rng.gen_range(min..=max)
    }

    pub fn byte(&mut self) -> u8 {
        self.rng.r#gen()
    }

    pub fn fill_bytes(&mut self, bytes: &mut [u8]) {
        self.rng.fill_bytes(bytes);
    }

    /// One fresh random note record.
    pub fn note_record(&mut self) -> [u8; NOTE_SIZE] {
        let mut record = [0u8; NOTE_SIZE];
        self.rng.fill_bytes(&mut record);
        record
    }
}

/// Tournament selection: draw `tournament_size` candidates uniformly with
/// replacement and return the index of the fittest; the first-seen candidate
/// wins ties. A tournament at least as large as the population degenerates
/// to a full scan and always returns the population's maximum.
pub fn tournament_select(
    population: &[Chromosome],
    tournament_size: usize,
    rng: &mut EvoRng,
) -> usize {
    assert!(!population.is_empty());
    if tournament_size >= population.len() {
        return best_index(population);
    }
    let mut winner = rng.index(population.len());
    for _ in 1..tournament_size {
        let challenger = rng.index(population.len());
        if population[challenger].fitness() > population[winner].fitness() {
            winner = challenger;
        }
    }
    winner
}

/// Snap a cut fraction to a note boundary within `len` bytes.
#[inline]
fn note_aligned_cut(len: usize, r: f64) -> usize {
    ((r * len as f64 / NOTE_SIZE as f64) as usize) * NOTE_SIZE
}

/// One-point crossover with note-aligned cuts.
///
/// `r` in [0, 1) picks both cut points: `cut = floor(r * len / NOTE_SIZE) *
/// NOTE_SIZE` per parent, so no record is ever split. Child 1 is
/// `parent1[..cut1] ++ parent2[cut2..]`, child 2 the complement; together
/// they conserve the parents' total length. If either child would exceed
/// [`MAX_GENES`], neither is produced and both children become plain copies
/// of their respective parents.
pub fn one_point_crossover(
    parent1: &Chromosome,
    parent2: &Chromosome,
    r: f64,
    child1: &mut Chromosome,
    child2: &mut Chromosome,
) {
    let cut1 = note_aligned_cut(parent1.len(), r);
    let cut2 = note_aligned_cut(parent2.len(), r);
    let len1 = cut1 + (parent2.len() - cut2);
    let len2 = cut2 + (parent1.len() - cut1);
    if len1 > MAX_GENES || len2 > MAX_GENES {
        child1.copy_from(parent1);
        child2.copy_from(parent2);
        return;
    }
    child1.splice(&parent1.genes()[..cut1], &parent2.genes()[cut2..]);
    child2.splice(&parent2.genes()[..cut2], &parent1.genes()[cut1..]);
}

/// Block mutation: walk the genome record by record, drawing one of three
/// operations uniformly at each position.
///
/// - insertion: with probability `mutation_rate`, insert a fresh random
///   record at the current position (refused silently at capacity);
/// - deletion: with probability `mutation_rate`, delete the current record
///   (refused silently on the last remaining record);
/// - substitution: replace each of the record's bytes independently with
///   probability `mutation_rate`.
///
/// The walk advances one position per step: a just-inserted record pushes
/// the current one ahead to be examined next, while deletion skips the
/// record that slides into the gap. Capacity bounds growth, so the walk
/// terminates.
pub fn mutate(chromosome: &mut Chromosome, mutation_rate: f64, rng: &mut EvoRng) {
    let mut i = 0;
    while i < chromosome.note_count() {
        match rng.index(3) {
            0 => {
                if rng.chance(mutation_rate) {
                    chromosome.insert_note(i, rng.note_record());
                }
            }
            1 => {
                if rng.chance(mutation_rate) {
                    chromosome.remove_note(i);
                }
            }
            _ => {
                let offset = i * NOTE_SIZE;
                for byte in &mut chromosome.genes_mut()[offset..offset + NOTE_SIZE] {
                    if rng.chance(mutation_rate) {
                        *byte = rng.byte();
                    }
                }
            }
        }
        i += 1;
    }
}
