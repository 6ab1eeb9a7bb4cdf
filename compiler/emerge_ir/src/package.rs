//! Package paths.

use std::fmt;
use std::rc::Rc;

use crate::{Name, StringLookup};

/// Dotted package path, e.g. `emerge.core`.
///
/// A path is a prefix of another when the other package is nested inside it;
/// package-level visibility is granted along that relation.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
pub struct PackagePath(Rc<[Name]>);

impl PackagePath {
    pub fn new(segments: impl IntoIterator<Item = Name>) -> Self {
        PackagePath(segments.into_iter().collect())
    }

    pub fn segments(&self) -> &[Name] {
        &self.0
    }

    /// The root package, with no segments.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `other` is this package or nested inside it.
    pub fn contains(&self, other: &PackagePath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Path of the enclosing package; the root package is its own parent.
    #[must_use]
    pub fn parent(&self) -> PackagePath {
        match self.0.split_last() {
            Some((_, rest)) => PackagePath(rest.into()),
            None => self.clone(),
        }
    }

    /// Render with `.` separators.
    pub fn display(&self, names: &impl StringLookup) -> String {
        let mut out = String::new();
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(names.lookup(*segment));
        }
        out
    }
}

impl fmt::Debug for PackagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests;
