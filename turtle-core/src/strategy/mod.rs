//! Signal strategies.

pub mod turtle;

pub use turtle::{analyze, decide, evaluate, ChannelSnapshot, ParamError, TurtleParams};
