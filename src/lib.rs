//! Batch launcher: runs external applications in numbered launch groups and
//! reports per-process exit codes and CPU times.

pub mod app;
pub mod group;
pub mod launcher;
pub mod logger;
pub mod manifest;
mod prelude;
pub mod process;
pub mod record;
pub mod report;
mod sys;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
