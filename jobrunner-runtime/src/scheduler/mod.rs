mod builder;
mod descriptor;
mod handle;
mod runner;

pub use builder::RunnerBuilder;
pub use descriptor::ScheduleSpec;
pub use handle::RunnerHandle;
pub use runner::Runner;
