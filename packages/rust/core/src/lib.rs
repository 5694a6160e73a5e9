//! Core orchestration for docbundle.
//!
//! This crate ties together enumeration, extraction and assembly into one
//! end-to-end run (see [`pipeline::run`]).

pub mod assembler;
pub mod coordinator;
pub mod pipeline;
pub mod walker;

pub use assembler::{OutputSink, render_artifact, render_block};
pub use coordinator::{Coordinator, FileExtractor, UnitExtractor};
pub use pipeline::{RunConfig, Source, run};
pub use walker::LocalEnumerator;
