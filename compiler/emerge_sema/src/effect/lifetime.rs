//! Whether an `exclusive` value is still held by its variable.

use emerge_ir::Span;

/// What is known about an `exclusive` variable at one point of a function
/// body.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VariableLifetime {
    Alive,
    /// The value was captured at `at`; `maybe` when only some paths
    /// captured it.
    Dead { at: Span, maybe: bool },
}

impl VariableLifetime {
    /// The state after one of two exclusive branches ran.
    #[must_use]
    pub fn combine_branch(self, other: VariableLifetime) -> VariableLifetime {
        use VariableLifetime::{Alive, Dead};
        match (self, other) {
            (Alive, Alive) => Alive,
            (Dead { at, maybe: a }, Dead { maybe: b, .. }) => Dead { at, maybe: a || b },
            (Dead { at, .. }, Alive) | (Alive, Dead { at, .. }) => Dead { at, maybe: true },
        }
    }

    /// The state after code that ends in `maybe` may or may not have run.
    #[must_use]
    pub fn combine_maybe(self, maybe: VariableLifetime) -> VariableLifetime {
        use VariableLifetime::{Alive, Dead};
        match (self, maybe) {
            (Alive, Dead { at, .. }) => Dead { at, maybe: true },
            _ => self,
        }
    }

    pub fn is_alive(self) -> bool {
        self == VariableLifetime::Alive
    }
}
