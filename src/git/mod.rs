pub mod clone;
pub mod command;
pub mod log;
pub mod repo;

pub use clone::ensure_cloned;
pub use command::{GitCli, DEFAULT_TIMEOUT};
pub use log::{collect_commits, parse_log, read_history, LogParser};
pub use repo::GitRepo;
