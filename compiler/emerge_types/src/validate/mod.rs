//! Use-site validation of type references.
//!
//! A type written in a declaration is checked where it is used: a parameter
//! type is an `in` use, a return type an `out` use, a mutable member variable
//! both. Type parameters declared `in`/`out` may only appear where values flow
//! the matching way.

use emerge_diagnostic::{ambiguous_type, unknown_type, Diagnostic, ErrorCode};
use emerge_ir::Span;

use crate::ty::NominalTy;
use crate::visibility::check_exposure;
use crate::{AccessSite, TypeRef, TypeRegistry, TypeUnification, Variance, Visibility};

/// How values flow through the place a type is written.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UseSiteRole {
    /// Values only flow in, e.g. parameters.
    In,
    /// Values only flow out, e.g. return types and read-only members.
    Out,
    /// Both, e.g. mutable member variables.
    Invariant,
    /// Variance does not matter here, e.g. local variables and nested arguments.
    Irrelevant,
}

impl UseSiteRole {
    /// The role of parameters of a function type used in this role.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            UseSiteRole::In => UseSiteRole::Out,
            UseSiteRole::Out => UseSiteRole::In,
            other => other,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            UseSiteRole::In => "in",
            UseSiteRole::Out => "out",
            UseSiteRole::Invariant => "invariant",
            UseSiteRole::Irrelevant => "irrelevant",
        }
    }

    fn allows(self, variance: Variance) -> bool {
        match self {
            UseSiteRole::In => variance != Variance::Out,
            UseSiteRole::Out => variance != Variance::In,
            UseSiteRole::Invariant => variance == Variance::Unspecified,
            UseSiteRole::Irrelevant => true,
        }
    }
}

/// The place a type reference is used.
#[derive(Clone, Debug)]
pub struct TypeUseSite {
    pub role: UseSiteRole,
    pub span: Span,
    pub access: AccessSite,
    /// Visibility of the declaration that makes the type visible to others.
    pub exposed_by: Option<Visibility>,
}

impl TypeUseSite {
    pub fn new(role: UseSiteRole, span: Span, access: AccessSite) -> Self {
        TypeUseSite {
            role,
            span,
            access,
            exposed_by: None,
        }
    }

    pub fn irrelevant(span: Span, access: AccessSite) -> Self {
        Self::new(UseSiteRole::Irrelevant, span, access)
    }

    #[must_use]
    pub fn exposed_by(mut self, visibility: Visibility) -> Self {
        self.exposed_by = Some(visibility);
        self
    }

    #[must_use]
    pub fn derive_irrelevant(&self) -> Self {
        self.with_role(UseSiteRole::Irrelevant)
    }

    #[must_use]
    pub fn with_role(&self, role: UseSiteRole) -> Self {
        TypeUseSite { role, ..self.clone() }
    }

    /// `E2009` when a parameter of the given variance cannot be used here.
    pub fn validate_for_variance(&self, variance: Variance, param_name: &str, span: Span) -> Option<Diagnostic> {
        if self.role.allows(variance) {
            return None;
        }
        Some(
            Diagnostic::error(ErrorCode::E2009)
                .with_message(format!(
                    "`{param_name}` is declared `{variance}` and cannot be used in {} position",
                    self.role.describe()
                ))
                .with_label(span, format!("{} position", self.role.describe())),
        )
    }
}

impl TypeRegistry {
    /// Check a type reference at its use site.
    pub fn validate(&self, ty: &TypeRef, site: &TypeUseSite) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        self.validate_into(ty, site, &mut out);
        out
    }

    fn validate_into(&self, ty: &TypeRef, site: &TypeUseSite, out: &mut Vec<Diagnostic>) {
        match ty {
            TypeRef::Nominal(n) => self.validate_nominal(n, site, out),
            TypeRef::Generic(g) | TypeRef::Variable(g) => {
                let def = self.param(g.param);
                let span = if g.span.is_dummy() { site.span } else { g.span };
                out.extend(site.validate_for_variance(def.variance, self.names().lookup(def.name), span));
            }
            TypeRef::Argument(arg) => self.validate_into(&arg.ty, &site.derive_irrelevant(), out),
            TypeRef::Nullable(inner) => self.validate_into(inner, site, out),
            TypeRef::Intersection(components) => {
                let before = out.len();
                for component in components.iter() {
                    self.validate_into(component, site, out);
                }
                self.validate_intersection(ty, components, site, out, before);
            }
            TypeRef::Union(components) => {
                for component in components.iter() {
                    self.validate_into(component, site, out);
                }
            }
            TypeRef::Function(f) => {
                let param_site = site.with_role(site.role.flipped());
                for param in f.params.iter() {
                    self.validate_into(param, &param_site, out);
                }
                self.validate_into(&f.ret, site, out);
            }
            TypeRef::Erroneous(e) => {
                let span = if e.span.is_dummy() { site.span } else { e.span };
                let name = self.names().lookup(e.name);
                if e.is_ambiguous() {
                    let candidates: Vec<String> = e
                        .candidates
                        .iter()
                        .map(|c| {
                            let def = self.base(*c);
                            format!("{}.{}", def.package.display(self.names()), self.names().lookup(def.name))
                        })
                        .collect();
                    out.push(ambiguous_type(span, name, &candidates));
                } else {
                    out.push(unknown_type(span, name));
                }
            }
        }
    }

    fn validate_nominal(&self, n: &NominalTy, site: &TypeUseSite, out: &mut Vec<Diagnostic>) {
        let span = if n.span.is_dummy() { site.span } else { n.span };
        let nested = site.derive_irrelevant();
        for arg in n.args() {
            self.validate_into(&arg.ty, &nested, out);
        }

        let def = self.base(n.base);
        let params = def.params();
        if !params.is_empty() || !n.args().is_empty() {
            let bindings = TypeUnification::from_explicit(self, params, params, n.args.as_deref(), span, false);
            out.extend(bindings.diagnostics().iter().cloned());
        }

        let name = self.names().lookup(def.name);
        out.extend(
            def.visibility
                .validate_access_from(&site.access, span, &format!("type `{name}`")),
        );
        if let Some(exposer) = &site.exposed_by {
            out.extend(check_exposure(exposer, &def.visibility, span, name));
        }
    }

    fn validate_intersection(
        &self,
        ty: &TypeRef,
        components: &[TypeRef],
        site: &TypeUseSite,
        out: &mut Vec<Diagnostic>,
        before: usize,
    ) {
        let span = if ty.span().is_dummy() { site.span } else { ty.span() };
        for (i, component) in components.iter().enumerate() {
            let Some(base) = component.nominal_base() else {
                continue;
            };
            if components[..i].iter().any(|c| c.nominal_base() == Some(base)) {
                out.push(
                    Diagnostic::error(ErrorCode::E2011)
                        .with_message(format!(
                            "`{}` appears more than once in this intersection",
                            self.base_name(base)
                        ))
                        .with_label(component.span(), "duplicate component")
                        .with_note("merge the components into one, e.g. `A<X & Y>` instead of `A<X> & A<Y>`"),
                );
            }
        }

        if out[before..].iter().any(Diagnostic::is_error) {
            return;
        }
        let simplified = self.simplify(ty);
        if simplified != *ty {
            out.push(
                Diagnostic::warning(ErrorCode::W3006)
                    .with_message(format!(
                        "`{}` can be simplified to `{}`",
                        self.render(ty),
                        self.render(&simplified)
                    ))
                    .with_label(span, "simplifiable type"),
            );
        }
    }
}
