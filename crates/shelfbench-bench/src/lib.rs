//! shelfbench benchmark suite
//!
//! Criterion benchmarks and a small CLI over `shelfbench-core`.
//!
//! # Benchmark Categories
//!
//! - **split_query**: one author with achievements and books.chapters,
//!   loaded with a single joined statement vs one statement per collection
//! - **no_tracking**: every author with the same includes, attached to the
//!   change tracker vs returned detached
//!
//! Both read `appsettings.json` (next to the executable, then the working
//! directory), ensure the schema exists, and seed when the Book table is
//! empty before measuring.

pub mod cli;
pub mod harness;

pub use cli::{Args, Command};
pub use harness::{time_variant, BenchContext, RunStats};
