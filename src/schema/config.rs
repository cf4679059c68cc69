//! Configuration types for evolution runs.

use serde::{Deserialize, Serialize};

fn default_population_size() -> usize {
    256
}

fn default_threads_per_island() -> usize {
    4
}

fn default_report_interval() -> u64 {
    10
}

/// Default seed base; worker seeds are derived from it per rank.
fn default_base_seed() -> u64 {
    1_202_107_158
}

fn default_tournament_size() -> usize {
    8
}

fn default_crossover_rate() -> f64 {
    0.97
}

fn default_mutation_rate() -> f64 {
    0.05
}

fn default_note_max_duration() -> f64 {
    5.0
}

/// Top-level run configuration, shared verbatim by every island.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Chromosomes per island population.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Generations to run. `None` runs until the process is stopped.
    #[serde(default)]
    pub max_generations: Option<u64>,
    /// Worker threads per island for evaluation and breeding.
    #[serde(default = "default_threads_per_island")]
    pub threads_per_island: usize,
    /// Generations between best-chromosome reductions to the leader.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
    /// Seed base; island `rank` seeds its streams from `base_seed + rank * 1999`.
    #[serde(default = "default_base_seed")]
    pub base_seed: u64,
    /// Genetic operator parameters.
    #[serde(default)]
    pub ga: GaConfig,
    /// Note decode scaling, resolved against the target recording.
    #[serde(default)]
    pub scaling: ScalingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            max_generations: None,
            threads_per_island: default_threads_per_island(),
            report_interval: default_report_interval(),
            base_seed: default_base_seed(),
            ga: GaConfig::default(),
            scaling: ScalingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::InvalidPopulationSize);
        }
        if self.threads_per_island == 0 {
            return Err(ConfigError::InvalidThreadCount);
        }
        if self.report_interval == 0 {
            return Err(ConfigError::InvalidReportInterval);
        }
        self.ga.validate()?;
        self.scaling.validate()?;
        Ok(())
    }
}

/// Genetic operator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaConfig {
    /// Candidates drawn (with replacement) per tournament selection.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Probability that a selected pair is crossed rather than copied.
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Per-record and per-byte mutation probability.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Multiply finite fitness by chromosome byte length, favoring denser tracks.
    #[serde(default)]
    pub length_weighted_fitness: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            tournament_size: default_tournament_size(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            length_weighted_fitness: false,
        }
    }
}

impl GaConfig {
    /// Validate operator parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tournament_size == 0 {
            return Err(ConfigError::InvalidTournamentSize);
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidRate { name, value: rate });
            }
        }
        Ok(())
    }
}

/// Note decode scaling, with optional overrides for the target-derived values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingConfig {
    /// Latest note start time in seconds. Defaults to the target's duration.
    #[serde(default)]
    pub song_max_duration: Option<f64>,
    /// Longest note duration in seconds.
    #[serde(default = "default_note_max_duration")]
    pub note_max_duration: f64,
    /// Highest note frequency in Hz. Defaults to the target's Nyquist frequency.
    #[serde(default)]
    pub frequency_max: Option<f64>,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            song_max_duration: None,
            note_max_duration: default_note_max_duration(),
            frequency_max: None,
        }
    }
}

impl ScalingConfig {
    /// Validate scaling parameters and overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("note_max_duration", Some(self.note_max_duration)),
            ("song_max_duration", self.song_max_duration),
            ("frequency_max", self.frequency_max),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ConfigError::InvalidScaling { name, value: v });
                }
            }
        }
        Ok(())
    }

    /// Resolve against the target recording: song duration defaults to the
    /// target's duration, frequency ceiling to its Nyquist frequency.
    pub fn resolve(&self, target_duration: f64, sample_rate: u32) -> ScalingParams {
        ScalingParams {
            song_max_duration: self.song_max_duration.unwrap_or(target_duration),
            note_max_duration: self.note_max_duration,
            frequency_max: self
                .frequency_max
                .unwrap_or(f64::from(sample_rate) / 2.0),
        }
    }
}

/// Resolved note decode scaling. Raw gene fields scale linearly into these
/// ranges, so the same chromosome decodes identically on every island.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    /// Latest note start time in seconds.
    pub song_max_duration: f64,
    /// Longest note duration in seconds.
    pub note_max_duration: f64,
    /// Highest note frequency in Hz.
    pub frequency_max: f64,
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be non-zero")]
    InvalidPopulationSize,
    #[error("Threads per island must be non-zero")]
    InvalidThreadCount,
    #[error("Report interval must be non-zero")]
    InvalidReportInterval,
    #[error("Tournament size must be non-zero")]
    InvalidTournamentSize,
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("{name} must be positive and finite, got {value}")]
    InvalidScaling { name: &'static str, value: f64 },
}
