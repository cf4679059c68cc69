//! Fixed-capacity binary genomes.

use std::fmt;

use crate::audio::NOTE_SIZE;
use crate::evolve::operators::EvoRng;

/// Gene buffer capacity in bytes. Genomes grow and shrink within this
/// limit; operators that would exceed it refuse instead of reallocating.
pub const MAX_GENES: usize = 4096;

/// Fresh random chromosomes hold between this many notes...
const INITIAL_MIN_NOTES: usize = 5;
/// ...and this many.
const INITIAL_MAX_NOTES: usize = 20;

/// A variable-length genome in a fixed inline buffer, plus the fitness
/// cached by the most recent evaluation.
///
/// Only the first `len` bytes are meaningful and `len` is always a whole
/// number of [`NOTE_SIZE`] records. Cloning copies the buffer; chromosomes
/// never own heap memory, so populations and migration messages have a
/// fixed footprint.
#[derive(Clone)]
pub struct Chromosome {
    genes: [u8; MAX_GENES],
    len: usize,
    fitness: f64,
}

impl Chromosome {
    /// An empty genome with zero fitness.
    pub fn empty() -> Self {
        Self {
            genes: [0; MAX_GENES],
            len: 0,
            fitness: 0.0,
        }
    }

    /// A random genome of [`INITIAL_MIN_NOTES`]..=[`INITIAL_MAX_NOTES`]
    /// whole note records.
    pub fn random(rng: &mut EvoRng) -> Self {
        let notes = rng.range(INITIAL_MIN_NOTES, INITIAL_MAX_NOTES);
        let mut chromosome = Self::empty();
        chromosome.len = notes * NOTE_SIZE;
        rng.fill_bytes(&mut chromosome.genes[..chromosome.len]);
        chromosome
    }

    /// Active gene bytes.
    #[inline]
    pub fn genes(&self) -> &[u8] {
        &self.genes[..self.len]
    }

    /// Mutable view of the active gene bytes (length cannot change here).
    #[inline]
    pub(crate) fn genes_mut(&mut self) -> &mut [u8] {
        &mut self.genes[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whole note records in the genome.
    #[inline]
    pub fn note_count(&self) -> usize {
        self.len / NOTE_SIZE
    }

    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[inline]
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Insert a record before `note_index`, shifting the tail right.
    /// Refuses (returning `false`, genome unchanged) when the buffer is full.
    pub fn insert_note(&mut self, note_index: usize, record: [u8; NOTE_SIZE]) -> bool {
        assert!(note_index <= self.note_count());
        if self.len + NOTE_SIZE > MAX_GENES {
            return false;
        }
        let offset = note_index * NOTE_SIZE;
        self.genes.copy_within(offset..self.len, offset + NOTE_SIZE);
        self.genes[offset..offset + NOTE_SIZE].copy_from_slice(&record);
        self.len += NOTE_SIZE;
        true
    }

    /// Remove the record at `note_index`, shifting the tail left. Refuses
    /// when only one record remains; a genome never mutates down to silence.
    pub fn remove_note(&mut self, note_index: usize) -> bool {
        assert!(note_index < self.note_count());
        if self.note_count() <= 1 {
            return false;
        }
        let offset = note_index * NOTE_SIZE;
        self.genes.copy_within(offset + NOTE_SIZE..self.len, offset);
        self.len -= NOTE_SIZE;
        true
    }

    /// Overwrite this genome with `head ++ tail` and reset fitness.
    /// The combined length must fit the buffer; callers check capacity first.
    pub(crate) fn splice(&mut self, head: &[u8], tail: &[u8]) {
        let total = head.len() + tail.len();
        assert!(total <= MAX_GENES, "spliced genome exceeds capacity");
        self.genes[..head.len()].copy_from_slice(head);
        self.genes[head.len()..total].copy_from_slice(tail);
        self.len = total;
        self.fitness = 0.0;
    }

    /// Become a byte-copy of `other`, fitness included.
    pub fn copy_from(&mut self, other: &Self) {
        self.genes[..other.len].copy_from_slice(other.genes());
        self.len = other.len;
        self.fitness = other.fitness;
    }
}

/// Genome equality: same active bytes. Fitness is a cache, not identity.
impl PartialEq for Chromosome {
    fn eq(&self, other: &Self) -> bool {
        self.genes() == other.genes()
    }
}

impl fmt::Debug for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chromosome")
            .field("notes", &self.note_count())
            .field("len", &self.len)
            .field("fitness", &self.fitness)
            .finish_non_exhaustive()
    }
}
