//! Progressive accumulation.
//!
//! The accumulator owns every resolution-sized host buffer (ray directions,
//! running sum, displayed average) plus the sample counter, and is the only
//! place those buffers are mutated.

mod accumulator;

pub use accumulator::{AccumulationError, AccumulationEvent, AccumulationPhase, Accumulator};
