//! Signatures handed to the lowering stage.
//!
//! Types are flattened into owned, serializable trees so the backend never
//! needs the registry. Only analyzed functions can be lowered, and only when
//! every part of the signature has a valid type.

use serde::Serialize;

use emerge_types::{TypeArgument, TypeRef};

use crate::binding::{FnId, FunctionKind, Program};
use crate::phase::Phase;
use crate::InternalCompilerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IrType {
    Nominal {
        name: String,
        package: String,
        /// Keyword of the effective mutability: `mut`, `read`, `const` or
        /// `exclusive`.
        mutability: String,
        args: Vec<IrTypeArgument>,
    },
    Parameter {
        name: String,
        mutability: Option<String>,
    },
    Nullable {
        inner: Box<IrType>,
    },
    Intersection {
        components: Vec<IrType>,
    },
    Union {
        components: Vec<IrType>,
    },
    Function {
        params: Vec<IrType>,
        ret: Box<IrType>,
        purity: String,
        nothrow: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IrTypeArgument {
    pub variance: String,
    pub ty: IrType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IrParam {
    pub name: String,
    pub ty: IrType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IrSignature {
    pub name: String,
    /// Base type of members, constructors and destructors.
    pub owner: Option<String>,
    pub type_params: Vec<String>,
    pub params: Vec<IrParam>,
    pub return_type: IrType,
    pub purity: String,
    pub nothrow: bool,
    pub external: bool,
}

impl Program {
    /// The signature of `id` after phase 2.
    ///
    /// Fails with [`InternalCompilerError::NotAnalyzed`] before phase 2 and
    /// with [`InternalCompilerError::ErroneousSignature`] when a parameter or
    /// the return type is unknown or erroneous; both mean the caller lowered
    /// something it should not have.
    pub fn lower_signature(&self, id: FnId) -> Result<IrSignature, InternalCompilerError> {
        let f = self.function(id);
        let entity = self.describe_function(id);
        if !f.phases.is_done(Phase::Two) {
            return Err(InternalCompilerError::NotAnalyzed {
                entity,
                purpose: "lower its signature",
            });
        }
        let erroneous = |part: String| InternalCompilerError::ErroneousSignature {
            entity: entity.clone(),
            part,
        };

        let mut params = Vec::with_capacity(f.params.len());
        for param in &f.params {
            let name = self.text(self.variable(*param).name).to_owned();
            let ty = self
                .variable_type(*param)
                .and_then(|ty| self.lower_type(&ty))
                .ok_or_else(|| erroneous(format!("parameter `{name}`")))?;
            params.push(IrParam { name, ty });
        }
        let return_type = self
            .return_type(id)
            .and_then(|ty| self.lower_type(&ty))
            .ok_or_else(|| erroneous("return type".to_owned()))?;

        Ok(IrSignature {
            name: self.text(f.name).to_owned(),
            owner: match f.kind {
                FunctionKind::TopLevel => None,
                FunctionKind::Member(base) | FunctionKind::Constructor(base) | FunctionKind::Destructor(base) => {
                    Some(self.text(self.base_type(base).name).to_owned())
                }
            },
            type_params: f
                .all_type_params
                .iter()
                .map(|p| self.text(self.registry().param(*p).name).to_owned())
                .collect(),
            params,
            return_type,
            purity: f.attributes.purity.to_string(),
            nothrow: f.attributes.is_nothrow(),
            external: f.attributes.external.is_some(),
        })
    }

    /// `None` for types containing unresolved names.
    fn lower_type(&self, ty: &TypeRef) -> Option<IrType> {
        let reg = self.registry();
        Some(match ty {
            TypeRef::Nominal(nominal) => {
                IrType::Nominal {
                    name: reg.base_name(nominal.base).to_owned(),
                    package: reg.base(nominal.base).package.display(self.names()),
                    mutability: nominal.mutability().to_string(),
                    args: nominal
                        .args()
                        .iter()
                        .map(|arg| self.lower_argument(arg))
                        .collect::<Option<_>>()?,
                }
            }
            TypeRef::Generic(generic) | TypeRef::Variable(generic) => IrType::Parameter {
                name: self.text(reg.param(generic.param).name).to_owned(),
                mutability: generic.explicit_mutability.map(|m| m.to_string()),
            },
            TypeRef::Argument(arg) => return self.lower_type(&arg.ty),
            TypeRef::Nullable(inner) => IrType::Nullable {
                inner: Box::new(self.lower_type(inner)?),
            },
            TypeRef::Intersection(components) => IrType::Intersection {
                components: components.iter().map(|c| self.lower_type(c)).collect::<Option<_>>()?,
            },
            TypeRef::Union(components) => IrType::Union {
                components: components.iter().map(|c| self.lower_type(c)).collect::<Option<_>>()?,
            },
            TypeRef::Function(function) => IrType::Function {
                params: function.params.iter().map(|p| self.lower_type(p)).collect::<Option<_>>()?,
                ret: Box::new(self.lower_type(&function.ret)?),
                purity: function.purity.to_string(),
                nothrow: function.nothrow,
            },
            TypeRef::Erroneous(_) => return None,
        })
    }

    fn lower_argument(&self, arg: &TypeArgument) -> Option<IrTypeArgument> {
        Some(IrTypeArgument {
            variance: arg.variance.to_string(),
            ty: self.lower_type(&arg.ty)?,
        })
    }
}
