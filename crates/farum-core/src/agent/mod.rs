//! The multi-stage reply pipeline.
//!
//! - `Stage`: one `(text, context) -> (text, context)` step, with `BoxStage`
//!   for heterogeneous lists
//! - `Listener`, `Planner`, `Reflector`: the three standard stages
//! - `Orchestrator`: runs stages as a strict left fold

pub mod listener;
pub mod orchestrator;
pub mod planner;
pub mod reflector;
pub mod stage;

pub use listener::Listener;
pub use orchestrator::Orchestrator;
pub use planner::Planner;
pub use reflector::Reflector;
pub use stage::{AgentInput, AgentOutput, BoxStage, Stage};
