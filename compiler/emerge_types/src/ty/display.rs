//! Rendering types for diagnostics.

use std::fmt;

use emerge_ir::StringLookup;

use crate::{TypeRegistry, Variance};

use super::TypeRef;

/// A type paired with the registry needed to name it.
pub struct TypeDisplay<'a> {
    pub(crate) reg: &'a TypeRegistry,
    pub(crate) ty: &'a TypeRef,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(self.reg, self.ty, f)
    }
}

fn write_type(reg: &TypeRegistry, ty: &TypeRef, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names = reg.names();
    match ty {
        TypeRef::Nominal(n) => {
            write!(f, "{} {}", n.mutability(), names.lookup(reg.base(n.base).name))?;
            if let Some(args) = &n.args {
                f.write_str("<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if arg.variance != Variance::Unspecified {
                        write!(f, "{} ", arg.variance)?;
                    }
                    write_type(reg, &arg.ty, f)?;
                }
                f.write_str(">")?;
            }
            Ok(())
        }
        TypeRef::Generic(g) | TypeRef::Variable(g) => {
            if let Some(m) = g.explicit_mutability {
                write!(f, "{m} ")?;
            }
            f.write_str(names.lookup(reg.param(g.param).name))
        }
        TypeRef::Argument(arg) => {
            if arg.variance != Variance::Unspecified {
                write!(f, "{} ", arg.variance)?;
            }
            write_type(reg, &arg.ty, f)
        }
        TypeRef::Nullable(inner) => {
            write_type(reg, inner, f)?;
            f.write_str("?")
        }
        TypeRef::Intersection(components) => write_joined(reg, components, " & ", f),
        TypeRef::Union(components) => write_joined(reg, components, " | ", f),
        TypeRef::Function(func) => {
            if func.nothrow {
                f.write_str("nothrow ")?;
            }
            write!(f, "{} (", func.purity)?;
            write_joined(reg, &func.params, ", ", f)?;
            f.write_str(") -> ")?;
            write_type(reg, &func.ret, f)
        }
        TypeRef::Erroneous(e) => f.write_str(names.lookup(e.name)),
    }
}

fn write_joined(reg: &TypeRegistry, types: &[TypeRef], sep: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write_type(reg, ty, f)?;
    }
    Ok(())
}
