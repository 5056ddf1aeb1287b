//! Resolution passes.
//!
//! ```text
//! Parse → Analysis → Statefulness → Rewrite
//!         ^^^^^^^^   ^^^^^^^^^^^^   ^^^^^^^
//!         analysis   statefulness   rewrite
//! ```
//!
//! # Analysis (`analysis`)
//!
//! Walks every definition once and records its own state variables (names
//! read that are not parameters), its call sites in encounter order, the
//! names it assigns, and the caller → callee edges of the call graph.
//!
//! # Statefulness (`statefulness`)
//!
//! Orders the call graph callees first, rejects unknown callees and
//! cycles, then decides statefulness bottom-up and allocates one state slot
//! per call site whose callee is stateful.
//!
//! # Rewrite (`rewrite`)
//!
//! Lowers each definition into the [`crate::ir`] form: names become indices,
//! stateful definitions gain unpack/pack statements and a state return, and
//! calls to stateful callees carry their slot.

pub mod analysis;
pub mod graph;
pub mod pipeline;
pub mod rewrite;
pub mod statefulness;
