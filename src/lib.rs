pub mod config;
pub mod error;
pub mod gate;
pub mod logging;
pub mod platform;
pub mod refresher;
pub mod signals;
pub mod stats;

pub use logging::init_tracing;
pub use refresher::{CycleReport, StatsRefresher, TickReport};
