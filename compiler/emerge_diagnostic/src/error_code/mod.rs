//! Diagnostic kinds.
//!
//! Each code is a unique identifier (e.g. `E2001`); the first digit names the
//! part of the semantic core that raises it. Messages are informative only,
//! callers and tests match on the code.

use std::fmt;

/// Diagnostic kinds raised by the semantic core.
///
/// Format: `E####` for errors, `W####` for warnings:
/// - E1xxx: declaration binding (duplicates, visibility, inheritance, invocation)
/// - E2xxx: type resolution and unification
/// - E3xxx / W3xxx: attributes, overloads, lints
/// - E4xxx: effect tracking (purity, nothrow, termination)
/// - E9xxx: limits
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ErrorCode {
    // Binding errors (E1xxx)
    /// Duplicate declaration in the same scope
    E1001,
    /// Global variable without an initializer
    E1002,
    /// Variable with neither a declared type nor an initializer
    E1003,
    /// Cyclic inheritance
    E1004,
    /// Member kind not allowed in this kind of base type
    E1005,
    /// Multiple constructors or destructors
    E1006,
    /// Abstract inherited function not implemented
    E1007,
    /// Overloads disagree on the presence of a receiver parameter
    E1008,
    /// Element not accessible from the use site
    E1009,
    /// Less visible type exposed through a more visible declaration
    E1010,
    /// Illegal supertype
    E1011,
    /// Function body missing or not allowed
    E1012,
    /// No overload matches the invocation
    E1013,
    /// Invocation matches several overloads
    E1014,
    /// `override` without an overridden function
    E1015,
    /// Assignment target cannot be assigned
    E1016,
    /// `return` without a value in a function returning a value
    E1017,
    /// Imported package does not exist
    E1018,
    /// Imported symbol is not declared in the package
    E1019,
    /// `break` or `continue` outside of a loop
    E1020,
    /// Operator not declared for the operand type
    E1021,
    /// Function invoked as an operator is not declared `operator`
    E1022,

    // Type errors (E2xxx)
    /// Value not assignable to the target type
    E2001,
    /// Unknown type
    E2002,
    /// Unknown identifier
    E2003,
    /// Missing type argument
    E2004,
    /// Cyclic type deduction
    E2005,
    /// Ambiguous type
    E2006,
    /// Superfluous type arguments
    E2007,
    /// Type argument variance contradicts the parameter variance
    E2008,
    /// Variance not allowed at this use site
    E2009,
    /// Unsatisfiable type variable constraints
    E2010,
    /// Illegal intersection type
    E2011,
    /// Type argument out of bounds
    E2012,
    /// Inferred type `_` not allowed here
    E2013,
    /// Type parameter shadows an outer type parameter
    E2014,
    /// Variance declared on a function type parameter
    E2015,
    /// Runtime type check against a type parameter
    E2016,

    // Attribute and overload errors (E3xxx)
    /// Conflicting function attributes
    E3003,
    /// External function not declared nothrow
    E3004,
    /// `operator` on a function that does not name an operator
    E3005,
    /// Overloads are not disjoint
    E3007,
    /// Inconsistent type arguments for the same ancestor
    E3010,
    /// Getter or setter breaks the accessor contract
    E3011,

    // Effect errors (E4xxx)
    /// Read beyond the purity boundary
    E4001,
    /// Write beyond the purity boundary
    E4002,
    /// Possibly throwing operation in a nothrow context
    E4003,
    /// Function body does not return on every path
    E4004,
    /// Variable read before it is definitely initialized
    E4005,
    /// `val` assigned where it may already be initialized
    E4006,
    /// Object used before all of its member variables are initialized
    E4007,
    /// Variable used after an `exclusive` value was captured from it
    E4008,
    /// `exclusive` value captured inside a loop
    E4009,

    // Limits (E9xxx)
    /// Too many errors
    E9001,

    // Warnings (W3xxx)
    /// Type name does not follow the naming convention
    W3001,
    /// Redundant function attribute
    W3002,
    /// Intersection type can be simplified
    W3006,
    /// Type argument variance repeats the parameter variance
    W3008,
    /// Declared visibility is broader than the enclosing declaration allows
    W3009,
    /// Null check on a value that cannot be null
    W3010,
}

impl ErrorCode {
    /// All variants, for exhaustive testing.
    ///
    /// Kept in sync with `as_str()`; `test_all_variants_listed` catches omissions.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E1007,
        ErrorCode::E1008,
        ErrorCode::E1009,
        ErrorCode::E1010,
        ErrorCode::E1011,
        ErrorCode::E1012,
        ErrorCode::E1013,
        ErrorCode::E1014,
        ErrorCode::E1015,
        ErrorCode::E1016,
        ErrorCode::E1017,
        ErrorCode::E1018,
        ErrorCode::E1019,
        ErrorCode::E1020,
        ErrorCode::E1021,
        ErrorCode::E1022,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E2010,
        ErrorCode::E2011,
        ErrorCode::E2012,
        ErrorCode::E2013,
        ErrorCode::E2014,
        ErrorCode::E2015,
        ErrorCode::E2016,
        ErrorCode::E3003,
        ErrorCode::E3004,
        ErrorCode::E3005,
        ErrorCode::E3007,
        ErrorCode::E3010,
        ErrorCode::E3011,
        ErrorCode::E4001,
        ErrorCode::E4002,
        ErrorCode::E4003,
        ErrorCode::E4004,
        ErrorCode::E4005,
        ErrorCode::E4006,
        ErrorCode::E4007,
        ErrorCode::E4008,
        ErrorCode::E4009,
        ErrorCode::E9001,
        ErrorCode::W3001,
        ErrorCode::W3002,
        ErrorCode::W3006,
        ErrorCode::W3008,
        ErrorCode::W3009,
        ErrorCode::W3010,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E1008 => "E1008",
            ErrorCode::E1009 => "E1009",
            ErrorCode::E1010 => "E1010",
            ErrorCode::E1011 => "E1011",
            ErrorCode::E1012 => "E1012",
            ErrorCode::E1013 => "E1013",
            ErrorCode::E1014 => "E1014",
            ErrorCode::E1015 => "E1015",
            ErrorCode::E1016 => "E1016",
            ErrorCode::E1017 => "E1017",
            ErrorCode::E1018 => "E1018",
            ErrorCode::E1019 => "E1019",
            ErrorCode::E1020 => "E1020",
            ErrorCode::E1021 => "E1021",
            ErrorCode::E1022 => "E1022",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            ErrorCode::E2012 => "E2012",
            ErrorCode::E2013 => "E2013",
            ErrorCode::E2014 => "E2014",
            ErrorCode::E2015 => "E2015",
            ErrorCode::E2016 => "E2016",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E3005 => "E3005",
            ErrorCode::E3007 => "E3007",
            ErrorCode::E3010 => "E3010",
            ErrorCode::E3011 => "E3011",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E4003 => "E4003",
            ErrorCode::E4004 => "E4004",
            ErrorCode::E4005 => "E4005",
            ErrorCode::E4006 => "E4006",
            ErrorCode::E4007 => "E4007",
            ErrorCode::E4008 => "E4008",
            ErrorCode::E4009 => "E4009",
            ErrorCode::E9001 => "E9001",
            ErrorCode::W3001 => "W3001",
            ErrorCode::W3002 => "W3002",
            ErrorCode::W3006 => "W3006",
            ErrorCode::W3008 => "W3008",
            ErrorCode::W3009 => "W3009",
            ErrorCode::W3010 => "W3010",
        }
    }

    /// Check if this is a binding error (E1xxx range).
    pub fn is_binding_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Check if this is a type error (E2xxx range).
    pub fn is_type_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    /// Check if this is an effect error (E4xxx range).
    pub fn is_effect_error(&self) -> bool {
        self.as_str().starts_with("E4")
    }

    /// Check if this code is raised as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ErrorCode::W3001
                | ErrorCode::W3002
                | ErrorCode::W3006
                | ErrorCode::W3008
                | ErrorCode::W3009
                | ErrorCode::W3010
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a code string like `"E2001"` or `"w3001"` (case-insensitive).
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
