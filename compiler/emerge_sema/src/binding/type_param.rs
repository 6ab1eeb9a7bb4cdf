//! Type parameters of base types and functions.

use emerge_diagnostic::{cyclic_type_deduction, duplicate_declaration, Diagnostic, ErrorCode};
use emerge_types::{TypeParamId, TypeUseSite, Variance, Visibility};

use crate::decl::TypeParamDecl;

use super::{FileIdx, Program, ScopeId};

/// A declared type parameter, registered with the type registry at build time.
#[derive(Clone, Debug)]
pub struct BoundTypeParam {
    pub id: TypeParamId,
    pub decl: TypeParamDecl,
}

impl Program {
    /// Duplicates, shadowing and bounds of the type parameters declared in
    /// `scope`.
    pub(crate) fn type_params_phase1(&self, params: &[BoundTypeParam], scope: ScopeId) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let outer = self.scope(scope).parent;
        for (i, param) in params.iter().enumerate() {
            let name = self.text(param.decl.name);
            if let Some(first) = params[..i].iter().find(|p| p.decl.name == param.decl.name) {
                out.push(duplicate_declaration(
                    param.decl.span,
                    first.decl.span,
                    "type parameter",
                    name,
                ));
            } else if let Some(shadowed) = outer.and_then(|o| self.lookup_type_param(o, param.decl.name)) {
                out.push(
                    Diagnostic::error(ErrorCode::E2014)
                        .with_message(format!("type parameter `{name}` shadows an outer type parameter"))
                        .with_label(param.decl.span, "shadows")
                        .with_secondary_label(self.reg.param(shadowed).span, "outer declaration"),
                );
            }

            let Some(bound) = &param.decl.bound else {
                continue;
            };
            let resolved = self.resolve_type(scope, bound);
            if self.reg.bound_is_cyclic(param.id, &resolved) {
                out.push(cyclic_type_deduction(bound.span, &format!("the bound of `{name}`")));
            } else {
                self.reg.set_bound(param.id, resolved);
            }
        }
        out
    }

    /// Bound validation. Function type parameters carry no variance.
    pub(crate) fn type_params_phase2(
        &self,
        params: &[BoundTypeParam],
        file: FileIdx,
        exposed_by: &Visibility,
        of_function: bool,
    ) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let access = self.file(file).access_site();
        for param in params {
            if of_function && param.decl.variance != Variance::Unspecified {
                out.push(
                    Diagnostic::error(ErrorCode::E2015)
                        .with_message(format!(
                            "function type parameter `{}` cannot be declared `{}`",
                            self.text(param.decl.name),
                            param.decl.variance
                        ))
                        .with_label(param.decl.span, "remove the variance"),
                );
            }
            if let (Some(written), true) = (&param.decl.bound, self.reg.param(param.id).bound_resolved()) {
                let site = TypeUseSite::irrelevant(written.span, access.clone()).exposed_by(exposed_by.clone());
                out.extend(self.validate_type(&self.reg.bound(param.id), &site));
            }
        }
        out
    }
}
