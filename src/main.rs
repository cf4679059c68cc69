//! Lyrebird CLI - evolve synthesized audio toward a target recording.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use serde::Serialize;

use lyrebird::{
    audio::{Synthesizer, TargetAudio, Track, save_wav},
    cluster::{self, GenerationReport, IslandStats, RunSummary},
    evolve::Chromosome,
    schema::{RunConfig, ScalingConfig, ScalingParams},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target recording (mono WAV)
    input: PathBuf,

    /// Output directory for evolved audio and metrics
    output: PathBuf,

    /// Chromosomes per island population
    #[arg(long, default_value_t = 256)]
    population_size: usize,

    /// Generations to run; runs until interrupted when absent
    #[arg(long)]
    generations: Option<u64>,

    /// Number of islands evolving in parallel
    #[arg(long, default_value_t = 2)]
    islands: usize,

    /// Worker threads per island
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Generations between best-chromosome reductions
    #[arg(long, default_value_t = 10)]
    report_interval: u64,

    /// Candidates drawn per tournament selection
    #[arg(long, default_value_t = 8)]
    tournament_size: usize,

    /// Probability that a selected pair is crossed rather than copied
    #[arg(long, default_value_t = 0.97)]
    crossover_rate: f64,

    /// Per-record and per-byte mutation probability
    #[arg(long, default_value_t = 0.05)]
    mutation_rate: f64,

    /// Multiply fitness by chromosome byte length
    #[arg(long)]
    length_weighted_fitness: bool,

    /// Base random seed; island `rank` derives its streams from it
    #[arg(long, default_value_t = 1_202_107_158)]
    seed: u64,

    /// Longest note duration in seconds
    #[arg(long, default_value_t = 5.0)]
    note_max_duration: f64,

    /// Override the target-derived latest note start time (seconds)
    #[arg(long)]
    song_max_duration: Option<f64>,

    /// Override the target-derived frequency ceiling (Hz)
    #[arg(long)]
    frequency_max: Option<f64>,
}

impl Args {
    fn to_config(&self) -> RunConfig {
        let mut config = RunConfig::default();
        config.population_size = self.population_size;
        config.max_generations = self.generations;
        config.threads_per_island = self.threads;
        config.report_interval = self.report_interval;
        config.base_seed = self.seed;
        config.ga.tournament_size = self.tournament_size;
        config.ga.crossover_rate = self.crossover_rate;
        config.ga.mutation_rate = self.mutation_rate;
        config.ga.length_weighted_fitness = self.length_weighted_fitness;
        config.scaling = ScalingConfig {
            song_max_duration: self.song_max_duration,
            note_max_duration: self.note_max_duration,
            frequency_max: self.frequency_max,
        };
        config
    }
}

/// One row per reduction, persisted to metrics.json.
#[derive(Debug, Clone, Serialize)]
struct MetricsRow {
    generation: u64,
    best_fitness: f64,
    duration_seconds: f64,
    note_count: usize,
    island_fitness: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct Metrics<'a> {
    input: String,
    islands: usize,
    config: &'a RunConfig,
    rows: &'a [MetricsRow],
    elapsed_seconds: f64,
    total_evaluations: u64,
    evaluations_per_second: f64,
    best_fitness: f64,
    island_stats: &'a [IslandStats],
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args = Args::parse();
    let config = args.to_config();
    config.validate().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let target = TargetAudio::load(&args.input).unwrap_or_else(|e| {
        eprintln!("Error loading target recording: {}", e);
        std::process::exit(1);
    });
    fs::create_dir_all(&args.output).unwrap_or_else(|e| {
        eprintln!("Error creating output directory: {}", e);
        std::process::exit(1);
    });

    let scaling = config
        .scaling
        .resolve(target.duration_seconds(), target.sample_rate());

    println!("Lyrebird");
    println!("========");
    println!(
        "Target: {} ({:.2}s at {} Hz, {} samples)",
        args.input.display(),
        target.duration_seconds(),
        target.sample_rate(),
        target.sample_count()
    );
    println!(
        "Islands: {} x {} chromosomes, {} threads each",
        args.islands, config.population_size, config.threads_per_island
    );
    match config.max_generations {
        Some(g) => println!("Generations: {}", g),
        None => println!("Generations: unbounded"),
    }
    println!();

    let rows: Mutex<Vec<MetricsRow>> = Mutex::new(Vec::new());
    let summary = cluster::launch(
        args.islands,
        &config,
        scaling,
        &target,
        |report: &GenerationReport| {
            println!(
                "Generation {}: fitness {:.4e}, {:.2}s, {} notes",
                report.generation, report.best_fitness, report.duration_seconds, report.note_count
            );
            let path = args
                .output
                .join(format!("audio_result_{}.wav", report.generation));
            save_best(&report.best, scaling, &target, &path);
            rows.lock().unwrap().push(MetricsRow {
                generation: report.generation,
                best_fitness: report.best_fitness,
                duration_seconds: report.duration_seconds,
                note_count: report.note_count,
                island_fitness: report.island_fitness.clone(),
            });
        },
    )
    .unwrap_or_else(|e| {
        eprintln!("Run failed: {}", e);
        std::process::exit(1);
    });

    save_best(
        &summary.best,
        scaling,
        &target,
        &args.output.join("audio_result_final.wav"),
    );

    let rows = rows.into_inner().unwrap_or_else(|e| e.into_inner());
    write_metrics(&args, &config, &summary, &rows);
    print_summary(&summary);
}

/// Render a chromosome against the target's buffer contract and save it.
/// A failed save mid-run is logged and skipped; the evolution continues.
fn save_best(best: &Chromosome, scaling: ScalingParams, target: &TargetAudio, path: &Path) {
    let track = Track::decode(best.genes(), &scaling);
    let mut synth = Synthesizer::new(target.sample_rate(), target.sample_count());
    let samples = synth.render(&track);
    if let Err(e) = save_wav(samples, target.sample_rate(), path) {
        log::warn!("Failed to save {}: {}", path.display(), e);
    }
}

fn write_metrics(args: &Args, config: &RunConfig, summary: &RunSummary, rows: &[MetricsRow]) {
    let elapsed = summary.elapsed.as_secs_f64();
    let metrics = Metrics {
        input: args.input.display().to_string(),
        islands: args.islands,
        config,
        rows,
        elapsed_seconds: elapsed,
        total_evaluations: summary.total_evaluations(),
        evaluations_per_second: summary.total_evaluations() as f64 / elapsed.max(f64::EPSILON),
        best_fitness: summary.best.fitness(),
        island_stats: &summary.islands,
    };
    let path = args.output.join("metrics.json");
    let json = serde_json::to_string_pretty(&metrics).expect("metrics serialize");
    if let Err(e) = fs::write(&path, json) {
        eprintln!("Error writing {}: {}", path.display(), e);
        std::process::exit(1);
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Run complete");
    println!("  Best fitness: {:.4e}", summary.best.fitness());
    println!("  Best genome: {} notes", summary.best.note_count());
    for island in &summary.islands {
        println!(
            "  Island {}: best {:.4e}, {} evaluations over {} generations",
            island.rank, island.best_fitness, island.evaluations, island.generations
        );
    }
    println!(
        "  Time: {:.2}s ({:.0} evaluations/s)",
        summary.elapsed.as_secs_f64(),
        summary.total_evaluations() as f64 / summary.elapsed.as_secs_f64().max(f64::EPSILON)
    );
}
