//! Emerge IR - identity types shared by every stage of the semantic core.
//!
//! - [`Span`]: a byte range inside one source file, tagged with its [`FileId`]
//! - [`Name`]: an interned identifier, resolved through a [`StringInterner`]
//! - [`PackagePath`]: the dotted package a declaration lives in
//!
//! Everything here is `Copy` or cheaply clonable and compares by value, so the
//! type system can embed these in its immutable type nodes.

mod interner;
mod name;
mod package;
mod span;

pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use package::PackagePath;
pub use span::{FileId, Span};
