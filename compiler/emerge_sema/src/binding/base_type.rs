//! Classes and interfaces declared in source.

use std::cell::OnceCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use emerge_diagnostic::{duplicate_declaration, Diagnostic, ErrorCode};
use emerge_ir::{Name, Span};
use emerge_types::{BaseTypeId, TypeRef, TypeUseSite, Visibility};

use crate::decl::{BaseTypeDeclKind, TypeExpr};
use crate::phase::{Guarded, PhaseTracker};
use crate::InternalCompilerError;

use super::function::FnBody;
use super::{BaseId, BoundTypeParam, Entity, FileIdx, FnId, OverloadSetId, Program, ScopeId, VarId};

/// A member variable and how the constructor treats it.
#[derive(Copy, Clone, Debug)]
pub struct MemberVariable {
    pub variable: VarId,
    /// Set from a constructor parameter of the same name.
    pub init_from_constructor: bool,
    pub decorated: bool,
}

#[derive(Debug)]
pub struct BoundBaseType {
    pub name: Name,
    pub kind: BaseTypeDeclKind,
    /// Handle in the type registry.
    pub id: BaseTypeId,
    pub span: Span,
    pub visibility: Visibility,
    pub type_params: Vec<BoundTypeParam>,
    pub member_variables: Vec<MemberVariable>,
    pub member_functions: Vec<FnId>,
    /// Declared constructors, or the generated default constructor.
    pub constructors: Vec<FnId>,
    pub destructors: Vec<FnId>,
    pub(crate) member_overload_sets: Vec<OverloadSetId>,
    pub(crate) supertype_decls: Vec<TypeExpr>,
    pub(crate) file: FileIdx,
    pub(crate) scope: ScopeId,
    pub(crate) phases: PhaseTracker,
    /// Diagnostics of supertype resolution, which may run before phase 1 of
    /// this type when a subtype needs it.
    pub(crate) supertype_diagnostics: OnceCell<Rc<[Diagnostic]>>,
}

impl BoundBaseType {
    pub fn is_interface(&self) -> bool {
        self.kind == BaseTypeDeclKind::Interface
    }
}

impl Program {
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn base_type_phase1(&self, id: BaseId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let base = self.base_type(id);
        base.phases.phase1(|| {
            let name = self.text(base.name);
            let mut out = self.type_params_phase1(&base.type_params, base.scope);
            self.ensure_supertypes(id);
            if let Some(diagnostics) = base.supertype_diagnostics.get() {
                out.extend(diagnostics.iter().cloned());
            }
            if self.config.lint_naming && !name.starts_with(|c: char| c.is_ascii_uppercase()) {
                out.push(
                    Diagnostic::warning(ErrorCode::W3001)
                        .with_message(format!("type name `{name}` should start with an uppercase letter"))
                        .with_label(base.span, "unconventional name"),
                );
            }
            out.extend(self.check_member_kinds(base));

            for (i, member) in base.member_variables.iter().enumerate() {
                let var = self.variable(member.variable);
                let earlier = base.member_variables[..i]
                    .iter()
                    .find(|m| self.variable(m.variable).name == var.name);
                if let Some(first) = earlier {
                    out.push(duplicate_declaration(
                        var.span,
                        self.variable(first.variable).span,
                        "member variable",
                        self.text(var.name),
                    ));
                }
                out.extend(self.check_visibility_shadowing(
                    &self.describe_variable(member.variable),
                    var.file,
                    var.visibility_decl.as_ref(),
                    &base.visibility,
                ));
                out.extend(self.variable_phase1(member.variable)?.iter().cloned());
            }
            for function in self.members_of(base) {
                out.extend(self.function_phase1(function)?.iter().cloned());
            }
            for set in &base.member_overload_sets {
                out.extend(self.overload_set_phase1(*set)?.iter().cloned());
            }
            out.extend(self.check_overrides(base));
            Ok(out)
        })
    }

    /// Constructors, destructors and member functions, in that order.
    fn members_of(&self, base: &BoundBaseType) -> Vec<FnId> {
        base.constructors
            .iter()
            .chain(&base.destructors)
            .chain(&base.member_functions)
            .copied()
            .collect()
    }

    /// `E1005` for members an interface cannot have, `E1006` for repeated
    /// constructors or destructors.
    fn check_member_kinds(&self, base: &BoundBaseType) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let declared_constructors: Vec<FnId> = base
            .constructors
            .iter()
            .copied()
            .filter(|c| !matches!(self.function(*c).body, FnBody::Generated))
            .collect();
        if base.is_interface() {
            let misplaced = base
                .member_variables
                .iter()
                .map(|m| (self.variable(m.variable).span, "member variables"))
                .chain(declared_constructors.iter().map(|c| (self.function(*c).span, "constructors")))
                .chain(base.destructors.iter().map(|d| (self.function(*d).span, "destructors")));
            for (span, what) in misplaced {
                out.push(
                    Diagnostic::error(ErrorCode::E1005)
                        .with_message(format!("interface `{}` cannot declare {what}", self.text(base.name)))
                        .with_label(span, "not allowed in an interface"),
                );
            }
        }
        for (members, what) in [(&declared_constructors, "constructor"), (&base.destructors, "destructor")] {
            if let [first, rest @ ..] = members.as_slice() {
                for extra in rest {
                    out.push(
                        Diagnostic::error(ErrorCode::E1006)
                            .with_message(format!("`{}` declares more than one {what}", self.text(base.name)))
                            .with_label(self.function(*extra).span, format!("another {what}"))
                            .with_secondary_label(self.function(*first).span, format!("first {what}")),
                    );
                }
            }
        }
        out
    }

    /// Resolve and register the supertypes of `id` once.
    ///
    /// Runs on demand for the supertypes of a type being resolved, so a
    /// supertype is always registered before its subtypes look at its
    /// ancestors. An edge back into a type whose supertypes are being
    /// resolved, or to a type that already is a subtype, is a cycle; it is
    /// reported and dropped.
    pub(crate) fn ensure_supertypes(&self, id: BaseId) {
        let base = self.base_type(id);
        if base.supertype_diagnostics.get().is_some() {
            return;
        }
        let guarded = self.cycles.guard(Entity::Supertypes(id), || {
            let mut out = Vec::new();
            let mut accepted = Vec::new();
            for decl in &base.supertype_decls {
                let ty = self.resolve_type(base.scope, decl);
                let Some(super_id) = ty.nominal_base() else {
                    if !ty.is_erroneous() {
                        out.push(illegal_supertype(decl.span, &self.reg.render(&ty), "only classes and interfaces can be extended"));
                    }
                    continue;
                };
                if let Some(super_base) = self.base_of(super_id) {
                    if self.cycles.is_active(Entity::Supertypes(super_base)) {
                        out.push(cyclic_inheritance(decl.span, self.text(base.name)));
                        continue;
                    }
                    self.ensure_supertypes(super_base);
                }
                if !self.reg.allows_subtypes(super_id) {
                    out.push(illegal_supertype(
                        decl.span,
                        &self.reg.render(&ty),
                        "it is not an interface",
                    ));
                    continue;
                }
                if super_id == base.id || self.reg.is_subtype_base(super_id, base.id) {
                    out.push(cyclic_inheritance(decl.span, self.text(base.name)));
                    continue;
                }
                accepted.push(ty);
            }
            self.reg.set_supertypes(base.id, accepted.into());
            out
        });
        if let Guarded::Completed(out) | Guarded::Cyclic(out) = guarded {
            let _ = base.supertype_diagnostics.set(out.into());
        }
    }

    /// `E1015` for `override` functions that override nothing.
    fn check_overrides(&self, base: &BoundBaseType) -> Vec<Diagnostic> {
        let inherited: FxHashSet<(Name, usize)> = self
            .reg
            .ancestors(base.id)
            .into_iter()
            .skip(1)
            .filter_map(|ancestor| self.base_of(ancestor))
            .flat_map(|ancestor| self.base_type(ancestor).member_functions.iter())
            .map(|f| (self.function(*f).name, self.function(*f).params.len()))
            .collect();
        base.member_functions
            .iter()
            .map(|f| self.function(*f))
            .filter(|f| f.attributes.is_override && !inherited.contains(&(f.name, f.params.len())))
            .map(|f| {
                Diagnostic::error(ErrorCode::E1015)
                    .with_message(format!(
                        "`{}` is declared override but no supertype declares it",
                        self.text(f.name)
                    ))
                    .with_label(f.span, "overrides nothing")
            })
            .collect()
    }

    pub fn base_type_phase2(&self, id: BaseId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let base = self.base_type(id);
        base.phases.phase2(|| {
            let mut out = self.type_params_phase2(&base.type_params, base.file, &base.visibility, false);
            let access = self.file(base.file).access_site();
            for decl in &base.supertype_decls {
                let ty = self.resolve_type(base.scope, decl);
                let site = TypeUseSite::irrelevant(decl.span, access.clone()).exposed_by(base.visibility.clone());
                out.extend(self.validate_type(&ty, &site));
            }
            out.extend(self.reg.inheritance_tree(base.id).diagnostics(&self.reg, base.span));

            for member in &base.member_variables {
                out.extend(self.variable_phase2(member.variable)?.iter().cloned());
            }
            for function in self.members_of(base) {
                out.extend(self.function_phase2(function)?.iter().cloned());
            }
            for set in &base.member_overload_sets {
                out.extend(self.overload_set_phase2(*set)?.iter().cloned());
            }
            Ok(out)
        })
    }

    pub fn base_type_phase3(&self, id: BaseId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let base = self.base_type(id);
        base.phases.phase3(false, || {
            let mut out = self.unimplemented_abstract_functions(base);
            for function in self.members_of(base) {
                out.extend(self.function_phase3(function)?.iter().cloned());
            }
            for set in &base.member_overload_sets {
                out.extend(self.overload_set_phase3(*set)?.iter().cloned());
            }
            Ok(out)
        })
    }

    /// `E1007` for every bodiless function a class inherits without
    /// implementing it.
    fn unimplemented_abstract_functions(&self, base: &BoundBaseType) -> Vec<Diagnostic> {
        if base.is_interface() {
            return Vec::new();
        }
        let hierarchy: Vec<BaseId> = self
            .reg
            .ancestors(base.id)
            .into_iter()
            .filter_map(|ancestor| self.base_of(ancestor))
            .collect();
        let implemented: FxHashSet<(Name, usize)> = hierarchy
            .iter()
            .flat_map(|b| self.base_type(*b).member_functions.iter())
            .map(|f| self.function(*f))
            .filter(|f| f.has_body())
            .map(|f| (f.name, f.params.len()))
            .collect();
        let mut out = Vec::new();
        for ancestor in &hierarchy {
            for function in &self.base_type(*ancestor).member_functions {
                let f = self.function(*function);
                if f.has_body() || f.attributes.external.is_some() || implemented.contains(&(f.name, f.params.len())) {
                    continue;
                }
                out.push(
                    Diagnostic::error(ErrorCode::E1007)
                        .with_message(format!(
                            "class `{}` does not implement `{}` from `{}`",
                            self.text(base.name),
                            self.text(f.name),
                            self.text(self.base_type(*ancestor).name)
                        ))
                        .with_label(base.span, "missing implementation")
                        .with_secondary_label(f.span, "declared here"),
                );
            }
        }
        out
    }

    /// The type of `self` inside the members of `id`.
    pub fn self_type(&self, id: BaseId) -> TypeRef {
        self.reg.nominal_self(self.base_type(id).id)
    }
}

fn cyclic_inheritance(span: Span, name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1004)
        .with_message(format!("`{name}` inherits from itself"))
        .with_label(span, "closes an inheritance cycle")
}

fn illegal_supertype(span: Span, supertype: &str, reason: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1011)
        .with_message(format!("`{supertype}` cannot be a supertype: {reason}"))
        .with_label(span, "illegal supertype")
}
