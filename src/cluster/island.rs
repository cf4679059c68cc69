//! One island: an independent population evolved by a dedicated thread pool.
//!
//! The island owns everything its generation loop touches: the double
//! population buffer, the rayon pool, one [`ThreadSlot`] per pool thread
//! and the master random stream. Each generation runs the fixed phase
//! sequence evaluate, elect, migrate, reduce (on cadence), barrier, breed,
//! swap; the mesh barrier guarantees no island starts breeding while a
//! peer is still exchanging migrants.

use rayon::ThreadPoolBuildError;
use rayon::prelude::*;

use crate::audio::Track;
use crate::cluster::launch::{GenerationReport, IslandStats};
use crate::cluster::mesh::{BestReport, IslandLinks, MeshError};
use crate::evolve::{
    Chromosome, EvalScratch, EvoRng, FitnessEvaluator, Population, best_index, mutate,
    one_point_crossover, split_chunks_mut, tournament_select,
};
use crate::schema::{GaConfig, RunConfig};

/// Working state owned by one pool thread: its random stream, evaluation
/// scratch and the write target for the unpaired child of an odd chunk.
/// Threads never share any of it, so evaluation and breeding run without
/// locks.
struct ThreadSlot {
    rng: EvoRng,
    scratch: EvalScratch,
    spare: Chromosome,
}

/// What an island hands back after its final generation.
pub struct IslandOutcome {
    pub stats: IslandStats,
    pub best: Chromosome,
}

/// An island worker, constructed fully (thread pool included) before any
/// worker in the cluster starts running.
pub struct Island {
    rank: usize,
    config: RunConfig,
    evaluator: FitnessEvaluator,
    links: IslandLinks,
    pool: rayon::ThreadPool,
    population: Population,
    slots: Vec<ThreadSlot>,
    rng: EvoRng,
    evaluations: u64,
    best_seen: Chromosome,
}

impl Island {
    /// Build an island: seeded population, per-thread slots and the pool.
    /// The master stream seeds the per-thread streams, so the whole island
    /// replays from `base_seed` and its rank alone.
    pub fn new(
        rank: usize,
        config: &RunConfig,
        evaluator: FitnessEvaluator,
        links: IslandLinks,
    ) -> Result<Self, ThreadPoolBuildError> {
        let mut rng = EvoRng::for_rank(config.base_seed, rank);
        let population = Population::random(config.population_size, &mut rng);
        let slots = (0..config.threads_per_island)
            .map(|_| ThreadSlot {
                rng: EvoRng::new(rng.next_seed()),
                scratch: evaluator.make_scratch(),
                spare: Chromosome::empty(),
            })
            .collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads_per_island)
            .build()?;
        let best_seen = population.current()[0].clone();

        log::debug!(
            "Island {rank}: {} chromosomes, {} worker threads",
            config.population_size,
            config.threads_per_island
        );

        Ok(Self {
            rank,
            config: config.clone(),
            evaluator,
            links,
            pool,
            population,
            slots,
            rng,
            evaluations: 0,
            best_seen,
        })
    }

    /// The live population (current buffer).
    pub fn population(&self) -> &[Chromosome] {
        self.population.current()
    }

    /// Run the generation loop to completion. `on_report` is invoked only
    /// on the leader island, once per due reduction.
    pub fn run(
        &mut self,
        on_report: &(dyn Fn(&GenerationReport) + Sync),
    ) -> Result<IslandOutcome, MeshError> {
        self.links.barrier()?;

        let mut generation: u64 = 0;
        while self.config.max_generations.is_none_or(|max| generation < max) {
            generation += 1;

            self.evaluate();

            let elected = self.population.current()[best_index(self.population.current())].clone();
            if elected.fitness() > self.best_seen.fitness() {
                self.best_seen = elected.clone();
            }

            self.migrate()?;
            if self.reduction_due(generation) {
                self.reduce(generation, &elected, on_report)?;
            }
            self.links.barrier()?;

            self.breed();
            self.population.swap();
        }

        self.links.barrier()?;

        Ok(IslandOutcome {
            stats: IslandStats {
                rank: self.rank,
                generations: generation,
                evaluations: self.evaluations,
                best_fitness: self.best_seen.fitness(),
            },
            best: self.best_seen.clone(),
        })
    }

    /// Parallel fitness evaluation: each pool thread scores its own
    /// contiguous chunk through its own scratch. Fitness from previous
    /// generations is overwritten wholesale.
    fn evaluate(&mut self) {
        let evaluator = &self.evaluator;
        let slots = &mut self.slots;
        let pool = &self.pool;
        let chunks = split_chunks_mut(self.population.current_mut(), slots.len());

        pool.install(|| {
            chunks
                .into_par_iter()
                .zip(slots.par_iter_mut())
                .for_each(|(chunk, slot)| {
                    for chromosome in chunk.iter_mut() {
                        let fitness = evaluator.evaluate(chromosome, &mut slot.scratch);
                        chromosome.set_fitness(fitness);
                    }
                });
        });

        self.evaluations += self.population.len() as u64;
    }

    /// Full-mesh migration: one tournament-selected chromosome exchanged
    /// with every peer, received migrant written back into the selected
    /// slot. Peers are visited in ascending rank order on every island.
    fn migrate(&mut self) -> Result<(), MeshError> {
        let tournament = self.config.ga.tournament_size;
        for peer in self.links.peer_ranks() {
            let slot = tournament_select(self.population.current(), tournament, &mut self.rng);
            let outgoing = self.population.current()[slot].clone();
            let incoming = self.links.exchange(peer, outgoing)?;
            self.population.current_mut()[slot] = incoming;
        }
        Ok(())
    }

    /// Gather every island's elected best to the leader and report the
    /// global maximum. The reduction never feeds back into a population.
    fn reduce(
        &mut self,
        generation: u64,
        elected: &Chromosome,
        on_report: &(dyn Fn(&GenerationReport) + Sync),
    ) -> Result<(), MeshError> {
        if !self.links.is_leader() {
            return self.links.send_best(BestReport {
                rank: self.rank,
                chromosome: elected.clone(),
            });
        }

        let reports = self.links.collect_bests()?;
        let mut island_fitness = Vec::with_capacity(self.links.world());
        island_fitness.push(elected.fitness());
        let mut global = elected;
        for report in &reports {
            island_fitness.push(report.chromosome.fitness());
            if report.chromosome.fitness() > global.fitness() {
                global = &report.chromosome;
            }
        }

        let track = Track::decode(global.genes(), self.evaluator.scaling());
        log::debug!(
            "Generation {generation}: best fitness {:.3e}, {} notes",
            global.fitness(),
            track.len()
        );
        on_report(&GenerationReport {
            generation,
            best_fitness: global.fitness(),
            duration_seconds: track.duration(),
            note_count: track.len(),
            island_fitness,
            best: global.clone(),
        });
        Ok(())
    }

    fn reduction_due(&self, generation: u64) -> bool {
        generation % self.config.report_interval == 0
            || self.config.max_generations == Some(generation)
    }

    /// Parallel breeding into the next buffer: every thread fills its own
    /// chunk pairwise from tournament picks over the whole current
    /// population. Reads and writes never alias.
    fn breed(&mut self) {
        let ga = self.config.ga.clone();
        let slots = &mut self.slots;
        let pool = &self.pool;
        let (current, next) = self.population.breeding_buffers();
        let chunks = split_chunks_mut(next, slots.len());

        pool.install(|| {
            chunks
                .into_par_iter()
                .zip(slots.par_iter_mut())
                .for_each(|(chunk, slot)| breed_chunk(current, chunk, &ga, slot));
        });
    }
}

/// Fill one next-buffer chunk with bred children. An odd chunk's last slot
/// still breeds a full pair but only child A is written and mutated; the
/// other child lands in the thread's spare buffer and is dropped.
fn breed_chunk(current: &[Chromosome], chunk: &mut [Chromosome], ga: &GaConfig, slot: &mut ThreadSlot) {
    let ThreadSlot { rng, spare, .. } = slot;
    for pair in chunk.chunks_mut(2) {
        let p1 = &current[tournament_select(current, ga.tournament_size, rng)];
        let p2 = &current[tournament_select(current, ga.tournament_size, rng)];

        let full_pair = pair.len() == 2;
        let (head, tail) = pair.split_at_mut(1);
        let child_a = &mut head[0];
        let child_b = tail.first_mut().unwrap_or(&mut *spare);

        if rng.chance(ga.crossover_rate) {
            one_point_crossover(p1, p2, rng.unit(), child_a, child_b);
        } else {
            child_a.copy_from(p1);
            child_b.copy_from(p2);
        }

        mutate(child_a, ga.mutation_rate, rng);
        if full_pair {
            mutate(child_b, ga.mutation_rate, rng);
        }
    }
}
