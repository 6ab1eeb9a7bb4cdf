//! Diagnostics for the Emerge semantic core.
//!
//! - [`ErrorCode`]: the diagnostic kinds; these are the contract, messages are not
//! - [`Diagnostic`]: builder-style finding with labels, notes and suggestions
//! - [`Diagnosis`]: the append-only sink every analysis phase reports into
//! - [`ErrorGuaranteed`]: proof that at least one error was reported
//!
//! Resolution, assignability and flow problems in user code are always
//! diagnostics. Bugs in the analysis itself are never reported here; they are
//! internal errors propagated as `Result`s by the crates above.

mod diagnostic;
mod error_code;
mod guarantee;
pub mod sink;

pub use diagnostic::{
    ambiguous_type, cyclic_type_deduction, duplicate_declaration, unknown_identifier,
    unknown_type, value_not_assignable, Diagnostic, Label, Severity,
};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use sink::{Diagnosis, DiagnosticConfig};
