//! Process supervision for portico: command execution, readiness polling,
//! the rebuild/reload state machine, periodic renewal, and supervised mode.

pub mod certbot;
mod error;
pub mod orchestrator;
pub mod port;
pub mod process;
pub mod renewal;
mod runtime;

pub use error::{ProcessError, SupervisorError, TimeoutError};
pub use orchestrator::{Orchestrator, OrchestratorState, RebuildReport};
pub use port::wait_for_port;
pub use process::{CommandRunner, CommandSpec, DryRunner, SystemRunner};
pub use renewal::RenewalTask;
pub use runtime::{block_on, init_tracing, supervise};
