pub mod arguments;
mod run;
pub mod scenario;

pub use run::{Report, StepReport, run, simulate, start};
