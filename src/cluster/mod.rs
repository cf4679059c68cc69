//! Cluster module - islands, migration mesh and run orchestration.

mod island;
mod launch;
mod mesh;

pub use island::{Island, IslandOutcome};
pub use launch::{GenerationReport, IslandStats, RunError, RunSummary, launch};
pub use mesh::{BestReport, IslandLinks, MeshError, build_mesh};
