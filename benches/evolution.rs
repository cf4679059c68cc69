//! Benchmarks for fitness evaluation and breeding throughput.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use lyrebird::{
    audio::TargetAudio,
    evolve::{
        Chromosome, EvoRng, FitnessEvaluator, mutate, one_point_crossover, tournament_select,
    },
    schema::ScalingParams,
};

fn tone_target(seconds: f64, sample_rate: u32) -> TargetAudio {
    let count = (seconds * f64::from(sample_rate)) as usize;
    let samples = (0..count)
        .map(|i| {
            let phase = std::f64::consts::TAU * 440.0 * i as f64 / f64::from(sample_rate);
            (phase.sin() * 12_000.0) as i16
        })
        .collect();
    TargetAudio::from_samples(samples, sample_rate).unwrap()
}

fn scaling(target: &TargetAudio) -> ScalingParams {
    ScalingParams {
        song_max_duration: target.duration_seconds(),
        note_max_duration: 1.0,
        frequency_max: f64::from(target.sample_rate()) / 2.0,
    }
}

fn chromosome_of_notes(notes: usize, rng: &mut EvoRng) -> Chromosome {
    let mut c = Chromosome::empty();
    for i in 0..notes {
        c.insert_note(i, rng.note_record());
    }
    c
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");

    let target = tone_target(2.0, 8_000);
    let params = scaling(&target);
    let evaluator = FitnessEvaluator::for_target(&target, params, false);
    let mut rng = EvoRng::new(42);

    for notes in [8, 32, 128] {
        let chromosome = chromosome_of_notes(notes, &mut rng);
        let mut scratch = evaluator.make_scratch();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_notes", notes)),
            &notes,
            |b, _| {
                b.iter(|| evaluator.evaluate(black_box(&chromosome), &mut scratch));
            },
        );
    }

    group.finish();
}

fn bench_breeding(c: &mut Criterion) {
    let mut group = c.benchmark_group("breeding");

    for size in [64, 256, 1024] {
        let mut rng = EvoRng::new(7);
        let mut population: Vec<Chromosome> =
            (0..size).map(|_| Chromosome::random(&mut rng)).collect();
        for (i, chromosome) in population.iter_mut().enumerate() {
            chromosome.set_fitness(i as f64);
        }
        let mut child_a = Chromosome::empty();
        let mut child_b = Chromosome::empty();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_population", size)),
            &size,
            |b, _| {
                b.iter(|| {
                    // One next-generation buffer's worth of child pairs.
                    for _ in 0..size / 2 {
                        let p1 = &population[tournament_select(&population, 8, &mut rng)];
                        let p2 = &population[tournament_select(&population, 8, &mut rng)];
                        if rng.chance(0.97) {
                            one_point_crossover(p1, p2, rng.unit(), &mut child_a, &mut child_b);
                        } else {
                            child_a.copy_from(p1);
                            child_b.copy_from(p2);
                        }
                        mutate(&mut child_a, 0.05, &mut rng);
                        mutate(&mut child_b, 0.05, &mut rng);
                    }
                    black_box(&child_a);
                });
            },
        );
    }

    group.finish();
}

fn bench_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("crossover");

    let mut rng = EvoRng::new(3);
    for notes in [4, 64, 300] {
        let p1 = chromosome_of_notes(notes, &mut rng);
        let p2 = chromosome_of_notes(notes, &mut rng);
        let mut child_a = Chromosome::empty();
        let mut child_b = Chromosome::empty();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_notes", notes)),
            &notes,
            |b, _| {
                b.iter(|| {
                    one_point_crossover(
                        black_box(&p1),
                        black_box(&p2),
                        rng.unit(),
                        &mut child_a,
                        &mut child_b,
                    );
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_evaluation, bench_breeding, bench_crossover);
criterion_main!(benches);
