// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`filter`] spawns and observes the optional filter command using
//!   `tokio::process::Command`.
//! - [`supervisor`] owns a started writer and filter and waits for them in
//!   downstream-first order, cascading cancellation to whichever is still live.

pub mod filter;
pub mod supervisor;

pub use filter::FilterProcess;
pub use supervisor::{SupervisorExit, cancel_children, supervise};
