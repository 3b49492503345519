pub mod config;
pub mod engine;
pub mod exercise;
pub mod pose;
pub mod session;
pub mod tracker;

pub use engine::{CueSink, FrameOutput, RepEngine, SessionSnapshot};
pub use exercise::ExerciseType;
