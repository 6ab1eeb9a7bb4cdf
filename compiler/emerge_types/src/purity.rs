//! Function purity levels.

use std::fmt;

/// How far a function may reach beyond its own boundary.
///
/// Ordered `Pure < ReadOnly < Modifying`; a level permits everything the
/// levels below it permit.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum Purity {
    /// Neither reads nor writes state outside the function.
    #[default]
    Pure,
    /// May read outside state.
    ReadOnly,
    /// May read and write outside state.
    Modifying,
}

impl Purity {
    /// Whether a function of purity `other` may be used where `self` is required.
    pub fn contains(self, other: Purity) -> bool {
        other <= self
    }

    /// The less restrictive of the two.
    #[must_use]
    pub fn weaker(self, other: Purity) -> Purity {
        self.max(other)
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Purity::Pure => "pure",
            Purity::ReadOnly => "read",
            Purity::Modifying => "mut",
        }
    }
}

impl fmt::Display for Purity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests;
