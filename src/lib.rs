pub mod analyze;
pub mod audit;
pub mod cache;
pub mod cli;
pub mod error;
pub mod git;
pub mod list;
pub mod logging;
pub mod model;
pub mod report;
pub mod roster;
pub mod scan;
pub mod util;
