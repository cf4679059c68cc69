//! Lyrebird - distributed evolution of synthesized audio.
//!
//! This crate evolves populations of variable-length binary genomes, each
//! decodable into a musical track, toward a genome whose synthesized audio
//! spectrally resembles a target recording. Several islands evolve
//! independent populations in parallel, exchange migrants every generation
//! over a full-mesh channel fabric, and periodically reduce their best
//! chromosomes to a leader for reporting.
//!
//! # Architecture
//!
//! - `schema`: configuration types and note-decode scaling
//! - `audio`: note codec, additive synthesis and WAV input/output
//! - `spectral`: FFT signatures and spectral distance
//! - `evolve`: chromosomes, genetic operators, populations and fitness
//! - `cluster`: islands, the migration mesh and run orchestration
//!
//! # Example
//!
//! ```rust,no_run
//! use lyrebird::{audio::TargetAudio, cluster, schema::RunConfig};
//!
//! let target = TargetAudio::load(std::path::Path::new("target.wav")).unwrap();
//!
//! let mut config = RunConfig::default();
//! config.max_generations = Some(100);
//! let scaling = config
//!     .scaling
//!     .resolve(target.duration_seconds(), target.sample_rate());
//!
//! // Two islands, reporting the global best at every reduction.
//! let summary = cluster::launch(2, &config, scaling, &target, |report| {
//!     println!(
//!         "generation {}: fitness {:.3e}, {} notes",
//!         report.generation, report.best_fitness, report.note_count
//!     );
//! })
//! .unwrap();
//!
//! println!("Best fitness: {:.3e}", summary.best.fitness());
//! ```

pub mod audio;
pub mod cluster;
pub mod evolve;
pub mod schema;
pub mod spectral;

// Re-export commonly used types
pub use cluster::{GenerationReport, RunError, RunSummary, launch};
pub use evolve::{Chromosome, FitnessEvaluator, MAX_GENES};
pub use schema::{RunConfig, ScalingParams};
