//! Definite initialization of variables along control flow.

/// What is known about a variable at one point of a function body.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VariableInitialization {
    NotInitialized,
    MaybeInitialized,
    Initialized,
}

impl VariableInitialization {
    /// The state after one of two exclusive branches ran.
    #[must_use]
    pub fn combine_branch(self, other: VariableInitialization) -> VariableInitialization {
        if self == other {
            self
        } else {
            VariableInitialization::MaybeInitialized
        }
    }

    /// The state after code that ends in `maybe` may or may not have run,
    /// e.g. a loop body.
    #[must_use]
    pub fn combine_maybe(self, maybe: VariableInitialization) -> VariableInitialization {
        use VariableInitialization::{Initialized, MaybeInitialized, NotInitialized};
        match (self, maybe) {
            (Initialized, _) => Initialized,
            (NotInitialized, NotInitialized) => NotInitialized,
            _ => MaybeInitialized,
        }
    }

    pub fn is_initialized(self) -> bool {
        self == VariableInitialization::Initialized
    }
}
