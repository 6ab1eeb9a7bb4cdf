//! Type system of the Emerge semantic core.
//!
//! - [`Mutability`]: the four-level mutability lattice
//! - [`TypeRef`]: immutable, `Rc`-shared type nodes (nominal, generic,
//!   nullable, intersection, union, function, erroneous)
//! - [`TypeRegistry`]: arena of base types and type parameters; everything that
//!   needs declarations (assignability, supertypes, simplification) lives here
//! - [`Unifier`] / [`TypeUnification`]: assignability plus type-variable
//!   inference, accumulating diagnostics instead of failing
//!
//! Types never own declarations. Base types and type parameters are referred
//! to by handle, so forward references and recursive bounds resolve through
//! the registry at the point of use.

mod ids;
mod inheritance;
mod instantiate;
mod mutability;
mod purity;
mod registry;
mod simplify;
mod supertype;
mod ty;
mod unify;
mod validate;
mod variance;
mod visibility;

pub use ids::{BaseTypeId, TypeParamId};
pub use inheritance::{InconsistentBinding, InheritanceTree};
pub use mutability::Mutability;
pub use purity::Purity;
pub use registry::{BaseTypeDef, BaseTypeFlags, BaseTypeKind, ParamOwner, TypeParamDef, TypeRegistry};
pub use ty::{
    BoundOp, ErroneousTy, FunctionTy, GenericTy, MutabilityOp, NominalTy, TypeArgument, TypeDisplay,
    TypeRef,
};
pub use unify::{DiagnosticDecorator, TypeUnification, Unifier, VariableState};
pub use validate::{TypeUseSite, UseSiteRole};
pub use variance::{Nullability, Variance};
pub use visibility::{check_exposure, AccessSite, Visibility};

#[cfg(test)]
mod test_support;
