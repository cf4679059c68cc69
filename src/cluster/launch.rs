//! Cluster launch: build the mesh, spawn one worker per island, aggregate.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::audio::TargetAudio;
use crate::cluster::island::{Island, IslandOutcome};
use crate::cluster::mesh::{MeshError, build_mesh};
use crate::evolve::{Chromosome, FitnessEvaluator};
use crate::schema::{ConfigError, RunConfig, ScalingParams};

/// Everything the leader knows at one reduction point.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Generation number, counted from 1.
    pub generation: u64,
    /// Fitness of the global best across all islands.
    pub best_fitness: f64,
    /// Decoded duration of the global best, in seconds.
    pub duration_seconds: f64,
    /// Decoded note count of the global best.
    pub note_count: usize,
    /// Each island's elected best fitness, indexed by rank.
    pub island_fitness: Vec<f64>,
    /// The global best chromosome itself.
    pub best: Chromosome,
}

/// Per-island outcome counters.
#[derive(Debug, Clone, Serialize)]
pub struct IslandStats {
    pub rank: usize,
    pub generations: u64,
    pub evaluations: u64,
    pub best_fitness: f64,
}

/// Aggregate outcome of a whole run.
#[derive(Debug)]
pub struct RunSummary {
    /// Best chromosome any island ever elected; ties go to the lowest rank.
    pub best: Chromosome,
    /// Per-island stats, indexed by rank.
    pub islands: Vec<IslandStats>,
    /// Wall-clock time between the first spawn and the last join.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Total evaluations across all islands.
    pub fn total_evaluations(&self) -> u64 {
        self.islands.iter().map(|island| island.evaluations).sum()
    }
}

/// Fatal launch and run failures. Genome-capacity refusals inside the
/// operators are not errors; everything here aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("A cluster needs at least one island")]
    EmptyCluster,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to build an island thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Island failed: {0}")]
    Island(#[from] MeshError),
}

/// Run a whole cluster: `world` islands over the shared configuration,
/// evolved against `target` under the resolved `scaling`.
///
/// Construction is all-or-nothing: the configuration is validated, the
/// target signature computed once, and every island (thread pool included)
/// built before the first worker thread spawns. `on_report` is invoked by
/// the leader island at every reduction; the library itself performs no
/// I/O inside the loop.
pub fn launch<F>(
    world: usize,
    config: &RunConfig,
    scaling: ScalingParams,
    target: &TargetAudio,
    on_report: F,
) -> Result<RunSummary, RunError>
where
    F: Fn(&GenerationReport) + Send + Sync,
{
    if world == 0 {
        return Err(RunError::EmptyCluster);
    }
    config.validate()?;

    log::info!(
        "Launching {world} islands: population {}, {} threads each, generations {:?}",
        config.population_size,
        config.threads_per_island,
        config.max_generations
    );

    let evaluator =
        FitnessEvaluator::for_target(target, scaling, config.ga.length_weighted_fitness);
    let islands = build_mesh(world)
        .into_iter()
        .enumerate()
        .map(|(rank, links)| Island::new(rank, config, evaluator.clone(), links))
        .collect::<Result<Vec<_>, _>>()?;

    let start = Instant::now();
    let on_report = &on_report;
    // Workers own their islands: when one exits early (error or panic) its
    // channel endpoints drop, and every peer's next exchange surfaces
    // Disconnected instead of stalling on a dead island.
    let outcomes: Vec<Result<IslandOutcome, MeshError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = islands
            .into_iter()
            .map(|mut island| scope.spawn(move || island.run(on_report)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    });
    let elapsed = start.elapsed();

    let mut stats = Vec::with_capacity(world);
    let mut best: Option<Chromosome> = None;
    for outcome in outcomes {
        let outcome = outcome?;
        // Ascending rank order with a strictly-greater fold: the lowest
        // rank wins fitness ties.
        if best
            .as_ref()
            .is_none_or(|b| outcome.best.fitness() > b.fitness())
        {
            best = Some(outcome.best);
        }
        stats.push(outcome.stats);
    }
    let best = best.expect("world is non-empty");

    log::info!(
        "Run complete: best fitness {:.3e} after {:.1}s",
        best.fitness(),
        elapsed.as_secs_f64()
    );

    Ok(RunSummary {
        best,
        islands: stats,
        elapsed,
    })
}
