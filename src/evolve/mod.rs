//! Evolution module - genomes, genetic operators, populations and fitness.

pub mod chromosome;
pub mod fitness;
pub mod operators;
pub mod population;

pub use chromosome::{Chromosome, MAX_GENES};
pub use fitness::{EvalScratch, FITNESS_SCALE, FitnessEvaluator};
pub use operators::{EvoRng, mutate, one_point_crossover, tournament_select};
pub use population::{Population, best_index, partition_chunks, split_chunks_mut};
