// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Crash runtime
//!
//! Executes compiled circuits and drives them to a stable output.
//!
//! - [`Registry`] holds a [`crash_resolve::CompiledUnit`] and hands out
//!   invocable [`Circuit`]s by name
//! - [`State`] is the opaque value a stateful circuit returns and expects back
//! - [`Simulator`] re-invokes one circuit under fixed inputs until its
//!   outputs stop changing or [`MAX_ITERATIONS`] is reached

pub mod error;
mod eval;
pub mod registry;
pub mod sim;
pub mod state;

pub use error::{Error, Result};
pub use registry::{Circuit, Invocation, Registry};
pub use sim::{MAX_ITERATIONS, Row, Settle, Simulator, Status};
pub use state::{State, Value};
