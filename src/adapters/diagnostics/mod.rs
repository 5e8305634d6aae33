pub mod jsonl;

pub use jsonl::JsonlDiagnostics;
