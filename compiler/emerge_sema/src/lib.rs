//! Semantic analysis of the Emerge language.
//!
//! A [`CompilationUnit`] takes declaration trees ([`decl`]), binds them into
//! a [`Program`] ([`binding`]) and runs every entity through the three
//! analysis phases ([`phase`]):
//!
//! 1. signatures: declared types, type parameter bounds, supertypes,
//!    attributes
//! 2. bodies: expression types, inferred variable and return types,
//!    invocation resolution, use-site validation
//! 3. effects: purity, `nothrow` and termination ([`effect`]), overload
//!    disjointness, abstract functions left unimplemented
//!
//! Later phases of one entity may pull earlier ones of another on demand.
//! Inference cycles are trapped and reported instead of recursing.
//!
//! User errors become diagnostics; a broken protocol is an
//! [`InternalCompilerError`].

pub mod binding;
mod config;
pub mod decl;
pub mod effect;
mod error;
mod lower;
pub mod phase;
pub mod tracing_setup;
mod unit;

pub use binding::Program;
pub use config::AnalysisConfig;
pub use error::InternalCompilerError;
pub use lower::{IrParam, IrSignature, IrType, IrTypeArgument};
pub use unit::{Analysis, CompilationUnit};
