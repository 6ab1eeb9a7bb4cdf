//! Resolution of written types and visibility modifiers.

use std::rc::Rc;

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_types::{BaseTypeId, TypeArgument, TypeRef, TypeUseSite, Visibility};

use crate::decl::{TypeExpr, TypeExprKind, VisibilityDecl, VisibilityKind};

use super::{FileIdx, Program, ScopeId};

impl Program {
    /// Resolve a written type in `scope`.
    ///
    /// Names that do not resolve to exactly one type become erroneous
    /// stand-ins; they are reported when the type is validated at its use
    /// site, never here.
    pub(crate) fn resolve_type(&self, scope: ScopeId, expr: &TypeExpr) -> TypeRef {
        emerge_stack::ensure_sufficient_stack(|| self.resolve_type_inner(scope, expr))
    }

    fn resolve_type_inner(&self, scope: ScopeId, expr: &TypeExpr) -> TypeRef {
        let resolved = match &expr.kind {
            TypeExprKind::Named { name, args } => {
                if let Some(param) = self.lookup_type_param(scope, *name) {
                    TypeRef::generic(param, expr.mutability, expr.span)
                } else {
                    let file = self.scope(scope).file;
                    let candidates: Vec<BaseTypeId> = self
                        .reg
                        .lookup(*name)
                        .iter()
                        .copied()
                        .filter(|id| self.is_in_namespace(file, &self.reg.base(*id).package, *name))
                        .collect();
                    if let [base] = candidates[..] {
                        let args = args.as_ref().map(|args| {
                            args.iter()
                                .map(|arg| TypeArgument {
                                    variance: arg.variance,
                                    ty: self.resolve_type_inner(scope, &arg.ty),
                                    span: arg.span,
                                })
                                .collect::<Rc<[_]>>()
                        });
                        TypeRef::nominal(base, args, self.reg.base(base).is_scalar(), expr.span)
                            .with_mutability(expr.mutability)
                    } else {
                        TypeRef::erroneous(*name, Rc::from(candidates), expr.span).with_mutability(expr.mutability)
                    }
                }
            }
            TypeExprKind::Function {
                params,
                ret,
                purity,
                nothrow,
            } => {
                let params: Rc<[TypeRef]> = params.iter().map(|p| self.resolve_type_inner(scope, p)).collect();
                TypeRef::function(params, self.resolve_type_inner(scope, ret), *purity, *nothrow, expr.span)
            }
            TypeExprKind::Intersection(components) => {
                let components: Rc<[TypeRef]> = components
                    .iter()
                    .map(|c| self.resolve_type_inner(scope, c))
                    .collect();
                let intersection = TypeRef::Intersection(components);
                match expr.mutability {
                    Some(_) => intersection.with_mutability(expr.mutability),
                    None => intersection,
                }
            }
            TypeExprKind::Union(components) => {
                let components: Rc<[TypeRef]> = components
                    .iter()
                    .map(|c| self.resolve_type_inner(scope, c))
                    .collect();
                let union = TypeRef::Union(components);
                match expr.mutability {
                    Some(_) => union.with_mutability(expr.mutability),
                    None => union,
                }
            }
        };
        resolved.with_combined_nullability(expr.nullability)
    }

    /// Whether a written type is the inference marker `_`.
    pub(crate) fn is_infer_marker(&self, expr: &TypeExpr) -> bool {
        matches!(&expr.kind, TypeExprKind::Named { name, .. } if self.text(*name) == "_")
    }

    pub(crate) fn resolve_visibility(&self, file: FileIdx, decl: Option<&VisibilityDecl>) -> Visibility {
        let info = self.file(file);
        match decl.map(|d| &d.kind) {
            None | Some(VisibilityKind::Module) => Visibility::Package(info.package.clone()),
            Some(VisibilityKind::File) => Visibility::file_of(&info.access_site()),
            Some(VisibilityKind::Package(path)) => Visibility::Package(path.clone()),
            Some(VisibilityKind::Export) => Visibility::Exported,
        }
    }

    /// `W3009` when a member asks for more visibility than its enclosing
    /// declaration has; the member is narrowed regardless.
    pub(crate) fn check_visibility_shadowing(
        &self,
        element: &str,
        file: FileIdx,
        declared: Option<&VisibilityDecl>,
        enclosing: &Visibility,
    ) -> Option<Diagnostic> {
        let decl = declared?;
        let written = self.resolve_visibility(file, Some(decl));
        if !written.is_strictly_broader_than(enclosing) {
            return None;
        }
        Some(
            Diagnostic::warning(ErrorCode::W3009)
                .with_message(format!(
                    "{element} is declared {written}, but its enclosing declaration is {enclosing}"
                ))
                .with_label(decl.span, "has no effect beyond the enclosing visibility"),
        )
    }

    /// Validate a type at its use site, honoring the lint configuration.
    pub(crate) fn validate_type(&self, ty: &TypeRef, site: &TypeUseSite) -> Vec<Diagnostic> {
        let mut diagnostics = self.reg.validate(ty, site);
        if !self.config.lint_simplifiable_types {
            diagnostics.retain(|d| d.code != ErrorCode::W3006);
        }
        diagnostics
    }
}
