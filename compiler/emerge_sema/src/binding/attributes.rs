//! Function attributes.

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::{Name, Span};
use emerge_types::Purity;

use crate::decl::{AccessorKind, AttributeDecl, AttributeKind};

/// Names a function must have to be declared `operator`.
const OPERATOR_NAMES: &[&str] = &[
    "unaryMinus",
    "negate",
    "and",
    "or",
    "xor",
    "plus",
    "minus",
    "times",
    "divideBy",
    "equals",
    "compareTo",
    "get",
    "set",
];

/// The attributes of one function, as written and as they take effect.
#[derive(Clone, Debug)]
pub struct AttributeList {
    decls: Vec<AttributeDecl>,
    /// First purity attribute written; `Pure` by default.
    pub purity: Purity,
    pub declared_nothrow: bool,
    /// Calling convention of an `external` function.
    pub external: Option<Name>,
    pub operator: bool,
    pub is_override: bool,
    /// First accessor attribute written.
    pub accessor: Option<AccessorKind>,
}

impl AttributeList {
    pub fn new(decls: Vec<AttributeDecl>) -> Self {
        let purity = decls
            .iter()
            .find_map(|a| match a.kind {
                AttributeKind::Purity(p) => Some(p),
                _ => None,
            })
            .unwrap_or_default();
        let has = |kind: &AttributeKind| decls.iter().any(|a| &a.kind == kind);
        AttributeList {
            purity,
            declared_nothrow: has(&AttributeKind::Nothrow),
            external: decls.iter().find_map(|a| match a.kind {
                AttributeKind::External(convention) => Some(convention),
                _ => None,
            }),
            operator: has(&AttributeKind::Operator),
            is_override: has(&AttributeKind::Override),
            accessor: decls.iter().find_map(|a| match a.kind {
                AttributeKind::Accessor(kind) => Some(kind),
                _ => None,
            }),
            decls,
        }
    }

    /// External functions cannot throw into Emerge code.
    pub fn is_nothrow(&self) -> bool {
        self.declared_nothrow || self.external.is_some()
    }

    pub fn span_of(&self, wanted: impl Fn(&AttributeKind) -> bool) -> Option<Span> {
        self.decls.iter().find(|a| wanted(&a.kind)).map(|a| a.span)
    }

    /// Redundant, conflicting and misapplied attributes.
    pub(crate) fn validate(&self, function: &str, span: Span) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for (i, attribute) in self.decls.iter().enumerate() {
            let earlier = &self.decls[..i];
            if let Some(first) = earlier.iter().find(|a| a.kind == attribute.kind) {
                out.push(
                    Diagnostic::warning(ErrorCode::W3002)
                        .with_message(format!("`{function}` repeats an attribute"))
                        .with_label(attribute.span, "redundant")
                        .with_secondary_label(first.span, "already declared here"),
                );
                continue;
            }
            if let AttributeKind::Accessor(kind) = attribute.kind {
                if let Some(conflict) = earlier
                    .iter()
                    .find(|a| matches!(a.kind, AttributeKind::Accessor(k) if k != kind))
                {
                    out.push(
                        Diagnostic::error(ErrorCode::E3003)
                            .with_message(format!("`{function}` cannot be both getter and setter"))
                            .with_label(attribute.span, format!("declared `{}` here", kind.keyword()))
                            .with_secondary_label(conflict.span, "conflicts with this"),
                    );
                    continue;
                }
            }
            if let AttributeKind::Purity(purity) = attribute.kind {
                if let Some(conflict) = earlier
                    .iter()
                    .find(|a| matches!(a.kind, AttributeKind::Purity(p) if p != purity))
                {
                    out.push(
                        Diagnostic::error(ErrorCode::E3003)
                            .with_message(format!("`{function}` declares conflicting purity"))
                            .with_label(attribute.span, format!("declared {purity} here"))
                            .with_secondary_label(conflict.span, "conflicts with this"),
                    );
                    continue;
                }
                if purity == Purity::Pure {
                    out.push(
                        Diagnostic::warning(ErrorCode::W3002)
                            .with_message(format!("`{function}` is pure by default"))
                            .with_label(attribute.span, "superfluous")
                            .with_suggestion("remove the attribute"),
                    );
                }
            }
        }

        if self.external.is_some() && !self.declared_nothrow {
            let at = self
                .span_of(|k| matches!(k, AttributeKind::External(_)))
                .unwrap_or(span);
            out.push(
                Diagnostic::error(ErrorCode::E3004)
                    .with_message(format!("external function `{function}` must be declared nothrow"))
                    .with_label(at, "declared external here")
                    .with_suggestion("add the `nothrow` attribute"),
            );
        }

        if self.operator && !OPERATOR_NAMES.contains(&function) {
            let at = self.span_of(|k| *k == AttributeKind::Operator).unwrap_or(span);
            out.push(
                Diagnostic::error(ErrorCode::E3005)
                    .with_message(format!("`{function}` does not name an operator"))
                    .with_label(at, "declared operator here")
                    .with_note(format!("operator functions are: {}", OPERATOR_NAMES.join(", "))),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests;
