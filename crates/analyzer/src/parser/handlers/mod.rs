/// Line handlers, one per family of G1 log lines

pub mod concurrent;
pub mod config;
pub mod cpu;
pub mod detail;
pub mod pause;
pub mod phase;
pub mod region;

pub use concurrent::ConcurrentHandler;
pub use config::ConfigHandler;
pub use cpu::CpuHandler;
pub use detail::DetailHandler;
pub use pause::{classify, Classification, PauseHandler};
pub use phase::PhaseHandler;
pub use region::RegionHandler;

use super::model::PatternError;
use super::traits::LineHandler;

/// Every handler, in the order lines are offered to them.
pub fn default_handlers() -> Result<Vec<Box<dyn LineHandler>>, PatternError> {
    Ok(vec![
        Box::new(ConfigHandler::new()?),
        Box::new(ConcurrentHandler::new()?),
        Box::new(PauseHandler::new()?),
        Box::new(CpuHandler::new()?),
        Box::new(RegionHandler::new()?),
        Box::new(PhaseHandler::new()?),
        Box::new(DetailHandler::new()?),
    ])
}
