//! Worker tasks that back the runtime orchestration.

mod session;

pub use session::{Command, SessionWorker};
