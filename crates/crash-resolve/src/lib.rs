// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Compile pipeline for the crash circuit language.
//!
//! Source text is lexed and parsed, then three passes run in order:
//!
//! 1. **analysis** - own state variables, call sites and the call graph
//! 2. **statefulness** - callee-first ordering, cycle rejection, slot allocation
//! 3. **rewrite** - lowering to the state-threading [`ir`]
//!
//! Every pass returns `Result<_, Vec<CompileError>>` so one run reports all
//! problems it can find. [`compile_source`] drives the whole pipeline.

pub mod error;
pub mod ir;
pub mod resolve;

pub use error::{CompileError, DiagnosticFormatter, ErrorKind, Label, Severity};
pub use ir::CompiledUnit;
pub use resolve::analysis::{Analysis, CallSite, DefinitionSummary};
pub use resolve::graph::DependencyGraph;
pub use resolve::pipeline::{CompileResult, Compilation, compile, compile_file, compile_source};
pub use resolve::statefulness::DepSlot;
