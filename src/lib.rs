#![warn(
    clippy::pedantic,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    rust_2021_compatibility
)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

//! `japi-compat` checks two releases of a Java library's public API for
//! binary- and source-compatibility regressions, working directly from
//! disassembled `.class` files rather than source.
//!
//! The pipeline: [`archive`] discovers and filters the class files of
//! each release; [`disasm`] turns a disassembler's textual output into a
//! [`model`] symbol table, alongside [`usage`] tables recording who
//! calls what; [`diff`] compares the two tables structurally; and
//! [`classify`] assigns each finding a binary- and source-compatibility
//! severity. [`affected`] turns a type-level finding into the list of
//! client-visible methods it reaches, and [`dump`] serializes one
//! version's table so a later run can diff against it without
//! re-disassembling. [`engine`] wires all of this into a single call.
//! ## Features
#![doc = document_features::document_features!()]

pub mod affected;
pub mod archive;
pub mod classify;
pub mod config;
pub mod diff;
pub mod disasm;
pub mod dump;
pub mod engine;
pub mod error;
pub mod model;
pub mod types;
pub mod usage;

pub use config::Options;
pub use engine::{run, Report};
pub use error::{EngineError, ExitCode};
