//! Population buffers and index partitioning.

use std::ops::Range;

use crate::evolve::chromosome::Chromosome;
use crate::evolve::operators::EvoRng;

/// An island's chromosomes, double-buffered so breeding reads the current
/// generation while writing the next. The buffers are allocated once and
/// swapped in place at the end of every generation.
pub struct Population {
    current: Vec<Chromosome>,
    next: Vec<Chromosome>,
}

impl Population {
    /// A population of `size` random chromosomes (plus the spare buffer).
    pub fn random(size: usize, rng: &mut EvoRng) -> Self {
        Self {
            current: (0..size).map(|_| Chromosome::random(rng)).collect(),
            next: vec![Chromosome::empty(); size],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// The live generation.
    #[inline]
    pub fn current(&self) -> &[Chromosome] {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut [Chromosome] {
        &mut self.current
    }

    /// Read view of the live generation plus write view of the next one,
    /// for breeding without aliasing.
    #[inline]
    pub fn breeding_buffers(&mut self) -> (&[Chromosome], &mut [Chromosome]) {
        (&self.current, &mut self.next)
    }

    /// Make the bred buffer current.
    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

/// Index of the maximum-fitness chromosome; first-seen wins ties.
pub fn best_index(population: &[Chromosome]) -> usize {
    let mut best = 0;
    for (i, chromosome) in population.iter().enumerate().skip(1) {
        if chromosome.fitness() > population[best].fitness() {
            best = i;
        }
    }
    best
}

/// Partition `0..len` into exactly `parts` contiguous ranges covering every
/// index once: `len / parts` each, with the first `len % parts` ranges one
/// longer. Trailing ranges are empty when `len < parts`.
pub fn partition_chunks(len: usize, parts: usize) -> Vec<Range<usize>> {
    assert!(parts > 0);
    let base = len / parts;
    let extra = len % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for part in 0..parts {
        let size = base + usize::from(part < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// Split a slice into the same chunks [`partition_chunks`] describes.
pub fn split_chunks_mut<T>(slice: &mut [T], parts: usize) -> Vec<&mut [T]> {
    let ranges = partition_chunks(slice.len(), parts);
    let mut chunks = Vec::with_capacity(parts);
    let mut rest = slice;
    for range in ranges {
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}
