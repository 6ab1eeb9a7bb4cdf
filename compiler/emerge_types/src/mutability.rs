//! The mutability lattice.
//!
//! Four guarantees a reference can carry about the object it points to.
//! `Exclusive` is the strongest: the holder is the only one with access and
//! may therefore hand it out as any of the others.

use std::fmt;

/// Reference capability of a type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Mutability {
    /// Writable through this reference; others may observe the writes.
    Mutable,
    /// Not writable through this reference; others may write.
    ReadOnly,
    /// Nobody can write; the value is const by construction.
    Immutable,
    /// The only reference in existence.
    Exclusive,
}

impl Mutability {
    pub const ALL: [Mutability; 4] = [
        Mutability::Mutable,
        Mutability::ReadOnly,
        Mutability::Immutable,
        Mutability::Exclusive,
    ];

    /// Whether a value with this mutability can be assigned to a reference of
    /// mutability `target`.
    pub const fn is_assignable_to(self, target: Mutability) -> bool {
        use Mutability::{Exclusive, Immutable, Mutable, ReadOnly};
        matches!(
            (self, target),
            (Mutable, Mutable)
                | (ReadOnly, ReadOnly)
                | (Immutable, Immutable)
                | (Exclusive, _)
                | (Mutable | Immutable, ReadOnly)
        )
    }

    /// Least upper bound: the strongest guarantee both sides still give.
    #[must_use]
    pub const fn union(self, other: Mutability) -> Mutability {
        use Mutability::{Exclusive, ReadOnly};
        match (self, other) {
            (Exclusive, x) | (x, Exclusive) => x,
            (a, b) if a as u8 == b as u8 => a,
            _ => ReadOnly,
        }
    }

    /// Greatest lower bound: a guarantee implying both sides.
    #[must_use]
    pub const fn intersect(self, other: Mutability) -> Mutability {
        use Mutability::{Exclusive, Immutable, Mutable, ReadOnly};
        match (self, other) {
            (Exclusive, _) | (_, Exclusive) => Exclusive,
            (Mutable, Mutable) | (Mutable, ReadOnly) | (ReadOnly, Mutable) => Mutable,
            (ReadOnly, ReadOnly) => ReadOnly,
            (Immutable, Immutable) | (ReadOnly, Immutable) | (Immutable, ReadOnly) => Immutable,
            (Mutable, Immutable) | (Immutable, Mutable) => Exclusive,
        }
    }

    /// Weaken to at most the guarantees `limit` allows.
    ///
    /// A mutable reference limited to read access becomes `ReadOnly`; an
    /// exclusive one takes the limit as is.
    #[must_use]
    pub const fn limited_to(self, limit: Mutability) -> Mutability {
        use Mutability::{Exclusive, Immutable, Mutable, ReadOnly};
        match (self, limit) {
            (Mutable, ReadOnly | Immutable) => ReadOnly,
            (Exclusive, Mutable | ReadOnly | Immutable) => limit,
            _ => self,
        }
    }

    /// Fill in a declaration-site default.
    ///
    /// Without a contextual mutability this is unchanged. Otherwise the result
    /// is the union, so an `Exclusive` side never leaks into the other.
    #[must_use]
    pub const fn combined_with(self, contextual: Option<Mutability>) -> Mutability {
        match contextual {
            None => self,
            Some(ctx) => self.union(ctx),
        }
    }

    /// `Exclusive` is only meaningful at the creation site; everywhere else it
    /// degrades to `Mutable`.
    #[must_use]
    pub const fn except_exclusive(self) -> Mutability {
        match self {
            Mutability::Exclusive => Mutability::Mutable,
            other => other,
        }
    }

    /// Source keyword for this mutability.
    pub const fn keyword(self) -> &'static str {
        match self {
            Mutability::Mutable => "mut",
            Mutability::ReadOnly => "read",
            Mutability::Immutable => "const",
            Mutability::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests;
