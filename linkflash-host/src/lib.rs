//! Host-side services for the linkflash tool
//!
//! Implements the parts of a flash attempt that touch the outside world,
//! on top of the pure logic in `linkflash-core`:
//!
//! - Header persistence with atomic saves
//! - External clean/build/flash commands
//! - Worker-thread orchestration of a flash sequence
//! - Serial port discovery
//! - `linkflash.toml` settings

#![deny(unsafe_code)]

pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod runner;
pub mod settings;
pub mod store;

pub use error::FlashError;
pub use orchestrator::{LogLine, Orchestrator, Tone, Trigger, WorkerEvent};
pub use ports::{discover_ports, PortPattern};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner, RunnerError, Step};
pub use settings::{Commands, Settings, SettingsError};
pub use store::{ConfigStore, FileStore, StoreError};
