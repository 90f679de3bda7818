// lib.rs
// Crate root: module declarations and the global profiler

pub mod app;
pub mod body;
pub mod cell_list;
pub mod commands;
pub mod config;
pub mod error;
pub mod init_config;
pub mod partition;
pub mod profiler;
pub mod simulation;
pub mod spawn;
pub mod species;

pub use error::{Result, SimError};
pub use simulation::{PointInfluence, Simulation};

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
