mod clone;
mod injector;

pub use clone::StagePlan;
pub use injector::{PipelineOutcome, PipelineReport, StageInjector, StageRunReport};
