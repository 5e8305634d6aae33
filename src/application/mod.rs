pub mod orchestrator;

pub use orchestrator::{OrchestratorError, OrchestratorStatus, RunCounters, SignalOrchestrator};
