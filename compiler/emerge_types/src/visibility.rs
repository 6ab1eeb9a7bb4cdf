//! Declaration visibility and access checks.

use std::fmt;

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::{FileId, PackagePath, Span};

/// Who can see a declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Visibility {
    /// Only code in the declaring file.
    File { file: FileId, package: PackagePath },
    /// Code in the given package and the packages nested inside it.
    Package(PackagePath),
    /// Everyone.
    Exported,
}

/// The place a declaration is used from.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct AccessSite {
    pub file: FileId,
    pub package: PackagePath,
}

impl AccessSite {
    pub fn new(file: FileId, package: PackagePath) -> Self {
        AccessSite { file, package }
    }
}

impl Visibility {
    /// File-private visibility for the given site.
    pub fn file_of(site: &AccessSite) -> Self {
        Visibility::File {
            file: site.file,
            package: site.package.clone(),
        }
    }

    pub fn is_accessible_from(&self, site: &AccessSite) -> bool {
        match self {
            Visibility::File { file, .. } => *file == site.file,
            Visibility::Package(package) => package.contains(&site.package),
            Visibility::Exported => true,
        }
    }

    /// Whether `self` reaches every site `other` does, and at least one more.
    pub fn is_strictly_broader_than(&self, other: &Visibility) -> bool {
        match (self, other) {
            (Visibility::Exported, Visibility::Exported) | (Visibility::File { .. }, _) => false,
            (Visibility::Exported, _) => true,
            (Visibility::Package(_), Visibility::Exported) => false,
            (Visibility::Package(outer), Visibility::Package(inner)) => {
                outer != inner && outer.contains(inner)
            }
            (Visibility::Package(outer), Visibility::File { package, .. }) => outer.contains(package),
        }
    }

    /// Whether some site can see `self` but not `other`.
    pub fn is_possibly_broader_than(&self, other: &Visibility) -> bool {
        !other.covers(self)
    }

    /// Every site that can see `other` can also see `self`.
    fn covers(&self, other: &Visibility) -> bool {
        match (self, other) {
            (Visibility::Exported, _) => true,
            (_, Visibility::Exported) => false,
            (Visibility::Package(outer), Visibility::Package(inner))
            | (Visibility::Package(outer), Visibility::File { package: inner, .. }) => {
                outer.contains(inner)
            }
            (Visibility::File { file: a, .. }, Visibility::File { file: b, .. }) => a == b,
            (Visibility::File { .. }, Visibility::Package(_)) => false,
        }
    }

    /// Narrow to `limit` if this reaches further than it.
    #[must_use]
    pub fn coerce_at_most(self, limit: &Visibility) -> Visibility {
        if self.is_strictly_broader_than(limit) {
            limit.clone()
        } else {
            self
        }
    }

    /// `E1009` when the element cannot be seen from `site`.
    pub fn validate_access_from(
        &self,
        site: &AccessSite,
        span: Span,
        element: &str,
    ) -> Option<Diagnostic> {
        if self.is_accessible_from(site) {
            return None;
        }
        Some(
            Diagnostic::error(ErrorCode::E1009)
                .with_message(format!("{element} is {self} and not accessible here"))
                .with_label(span, "not accessible"),
        )
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::File { .. } => f.write_str("private to its file"),
            Visibility::Package(_) => f.write_str("private to its package"),
            Visibility::Exported => f.write_str("exported"),
        }
    }
}

/// `E1010` when `exposer` can be seen from places `exposed` cannot.
pub fn check_exposure(
    exposer: &Visibility,
    exposed: &Visibility,
    span: Span,
    type_name: &str,
) -> Option<Diagnostic> {
    if !exposer.is_possibly_broader_than(exposed) {
        return None;
    }
    Some(
        Diagnostic::error(ErrorCode::E1010)
            .with_message(format!(
                "type `{type_name}` is {exposed} but is exposed by a declaration that is {exposer}"
            ))
            .with_label(span, "exposes a less visible type"),
    )
}
