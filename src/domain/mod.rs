//! Domain Layer - Core value types for the pairs engine
//!
//! Pure types with no I/O. All external interactions happen through the ports layer.

pub mod decision;
pub mod instrument;
pub mod slice;

pub use decision::{Decision, PairState};
pub use instrument::{Instrument, Pair};
pub use slice::PriceSlice;
